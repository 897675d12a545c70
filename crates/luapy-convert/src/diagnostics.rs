//! Non-fatal warnings collected during conversion.
//!
//! Every problem the converter notices is recorded here instead of aborting:
//! the caller always gets best-effort Python plus this list, and the list is
//! rendered as a comment block at the top of the output.

use serde::Serialize;
use std::fmt;

/// What went wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Input exceeded the line-count threshold.
    OversizedInput,
    /// A `[[ ... ]]` string or `--[[ ... ]]` comment never closed.
    UnterminatedLiteral,
    /// A block was still open at end of input.
    UnterminatedConstruct,
    /// `end` with no open block.
    UnmatchedCloser,
    /// `end` indented deeper than the block it closed.
    MisalignedCloser,
    /// `goto` naming a label that never appears.
    UnresolvedGoto,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::OversizedInput => "oversized-input",
            DiagnosticKind::UnterminatedLiteral => "unterminated-literal",
            DiagnosticKind::UnterminatedConstruct => "unterminated-construct",
            DiagnosticKind::UnmatchedCloser => "unmatched-closer",
            DiagnosticKind::MisalignedCloser => "misaligned-closer",
            DiagnosticKind::UnresolvedGoto => "unresolved-goto",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One warning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Source line (1-indexed) the warning refers to.
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: None,
            message: message.into(),
        }
    }

    /// Attach a 1-indexed source line.
    pub fn at(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Append-only, ordered diagnostic list.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(kind = %diagnostic.kind, "{}", diagnostic);
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

/// Render diagnostics as a leading Python comment block.
///
/// Returns an empty string when there is nothing to report.
pub fn render_block(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }
    let mut out = String::from("# Warnings:\n");
    for diagnostic in diagnostics {
        out.push_str("# ");
        out.push_str(&diagnostic.to_string());
        out.push('\n');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_line_tagged_block() {
        let diagnostics = vec![
            Diagnostic::new(DiagnosticKind::UnterminatedConstruct, "unclosed if").at(3),
            Diagnostic::new(DiagnosticKind::OversizedInput, "input is very large"),
        ];
        assert_eq!(
            render_block(&diagnostics),
            "# Warnings:\n# line 3: unclosed if\n# input is very large\n\n"
        );
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert_eq!(render_block(&[]), "");
    }

    #[test]
    fn counts_by_kind() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(Diagnostic::new(DiagnosticKind::UnmatchedCloser, "stray end").at(1));
        diagnostics.push(Diagnostic::new(DiagnosticKind::UnmatchedCloser, "stray end").at(2));
        assert_eq!(diagnostics.count(DiagnosticKind::UnmatchedCloser), 2);
        assert_eq!(diagnostics.count(DiagnosticKind::UnresolvedGoto), 0);
    }
}
