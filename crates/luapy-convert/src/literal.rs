//! Multi-line `[[ ... ]]` strings and `--[[ ... ]]` comments.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::source::SourceLine;

const CLOSER: &str = "]]";

/// Which long-bracket form is being consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralKind {
    Comment,
    String,
}

impl LiteralKind {
    pub fn opener(&self) -> &'static str {
        match self {
            LiteralKind::Comment => "--[[",
            LiteralKind::String => "[[",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            LiteralKind::Comment => "comment",
            LiteralKind::String => "string",
        }
    }
}

/// Result of consuming one long literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Text between the opener and the closer, lines joined by `\n`.
    pub body: String,
    /// Index of the first line after the literal.
    pub next: usize,
    /// Text after the closer on the closing line.
    pub trailing: String,
}

/// Consume a long literal whose opener starts at byte `column` of line `start`.
///
/// A literal closed on its opening line returns immediately with
/// `next = start + 1`. Otherwise lines are scanned forward with a nesting
/// counter: a stripped line beginning with the opener nests one level, a line
/// containing the closer unnests one. An unterminated literal is diagnosed and
/// swallows the rest of the input.
pub fn extract(
    lines: &[SourceLine],
    start: usize,
    column: usize,
    kind: LiteralKind,
    diagnostics: &mut Diagnostics,
) -> Extracted {
    let opener = kind.opener();
    let first = &lines[start].raw;
    let remainder = first.get(column + opener.len()..).unwrap_or("");

    if let Some((body, trailing)) = remainder.split_once(CLOSER) {
        return Extracted {
            body: body.to_string(),
            next: start + 1,
            trailing: trailing.trim().to_string(),
        };
    }

    let mut body = vec![remainder.trim_end().to_string()];
    let mut nesting = 1usize;
    let mut i = start + 1;
    while i < lines.len() {
        let line = &lines[i];
        if line.stripped.starts_with(opener) {
            nesting += 1;
        }
        if line.raw.contains(CLOSER) {
            nesting -= 1;
            if nesting == 0 {
                let (last, trailing) = line.raw.split_once(CLOSER).unwrap_or((&line.raw, ""));
                body.push(last.to_string());
                return Extracted {
                    body: body.join("\n"),
                    next: i + 1,
                    trailing: trailing.trim().to_string(),
                };
            }
        }
        body.push(line.raw.clone());
        i += 1;
    }

    diagnostics.push(
        Diagnostic::new(
            DiagnosticKind::UnterminatedLiteral,
            format!("multi-line {} is never closed", kind.describe()),
        )
        .at(start + 1),
    );
    Extracted {
        body: body.join("\n"),
        next: lines.len(),
        trailing: String::new(),
    }
}
