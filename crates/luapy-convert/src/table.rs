//! Lua table constructors as Python lists and dicts.
//!
//! A body whose entries are all positional becomes a list. As soon as one
//! entry carries a key (`[expr] = v` or `name = v`) the whole body becomes a
//! dict, and positional entries get their implicit 1-based index as key, so
//! mixed bodies still yield a valid mapping.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::scan::{find_assignment, is_identifier, split_comment, split_top_level};
use crate::source::SourceLine;

const CONTROL_KEYWORDS: &[&str] = &[
    "function", "if", "for", "while", "local", "and", "or", "not", "return",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableValue {
    /// Lua expression text, not yet rewritten.
    Raw(String),
    Table(TableLiteral),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Python key text (`'name'` or the bracketed expression), if keyed.
    pub key: Option<String>,
    pub value: TableValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableLiteral {
    pub entries: Vec<TableEntry>,
}

impl TableLiteral {
    /// Decided once over the whole body.
    pub fn is_mapping(&self) -> bool {
        self.entries.iter().any(|e| e.key.is_some())
    }

    fn delimiters(&self) -> (&'static str, &'static str) {
        if self.is_mapping() { ("{", "}") } else { ("[", "]") }
    }

    /// Keys in output order, with implicit indices for positional entries.
    fn keys(&self) -> Vec<Option<String>> {
        let mapping = self.is_mapping();
        let mut position = 0;
        self.entries
            .iter()
            .map(|entry| match &entry.key {
                Some(key) => Some(key.clone()),
                None if mapping => {
                    position += 1;
                    Some(position.to_string())
                }
                None => None,
            })
            .collect()
    }

    /// Render on one line.
    pub fn render_inline(&self, rewrite: &mut dyn FnMut(&str) -> String) -> String {
        if self.entries.is_empty() {
            return "[]".to_string();
        }
        let (open, close) = self.delimiters();
        let items: Vec<String> = self
            .entries
            .iter()
            .zip(self.keys())
            .map(|(entry, key)| {
                let value = match &entry.value {
                    TableValue::Raw(raw) => rewrite(raw),
                    TableValue::Table(table) => table.render_inline(rewrite),
                };
                match key {
                    Some(key) => format!("{}: {value}", render_key(&key, rewrite)),
                    None => value,
                }
            })
            .collect();
        format!("{open}{}{close}", items.join(", "))
    }

    /// Render one entry per line. `head` is prepended to the opening line;
    /// the closing delimiter is the last line, without indentation suffix.
    pub fn render_block(
        &self,
        head: &str,
        depth: usize,
        width: usize,
        rewrite: &mut dyn FnMut(&str) -> String,
    ) -> Vec<String> {
        let pad = " ".repeat(depth * width);
        if self.entries.is_empty() {
            return vec![format!("{pad}{head}[]")];
        }
        let (open, close) = self.delimiters();
        let mut out = vec![format!("{pad}{head}{open}")];
        let inner = " ".repeat((depth + 1) * width);
        for (entry, key) in self.entries.iter().zip(self.keys()) {
            let prefix = match key {
                Some(key) => format!("{}: ", render_key(&key, rewrite)),
                None => String::new(),
            };
            match &entry.value {
                TableValue::Raw(raw) => out.push(format!("{inner}{prefix}{},", rewrite(raw))),
                TableValue::Table(table) => {
                    let mut nested = table.render_block(&prefix, depth + 1, width, rewrite);
                    if let Some(last) = nested.last_mut() {
                        last.push(',');
                    }
                    out.extend(nested);
                }
            }
        }
        out.push(format!("{pad}{close}"));
        out
    }
}

fn render_key(key: &str, rewrite: &mut dyn FnMut(&str) -> String) -> String {
    if key.starts_with('\'') || key.parse::<i64>().is_ok() {
        key.to_string()
    } else {
        rewrite(key)
    }
}

/// Interpret the text before an `=` as a key.
fn classify_key(target: &str) -> Option<String> {
    let target = target.trim();
    if let Some(inner) = target.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return Some(inner.trim().to_string());
    }
    if is_identifier(target) && !CONTROL_KEYWORDS.contains(&target) {
        return Some(format!("'{target}'"));
    }
    None
}

/// Split one entry into key and value text.
fn classify(entry: &str) -> (Option<String>, &str) {
    if let Some(eq) = find_assignment(entry)
        && let Some(key) = classify_key(&entry[..eq])
    {
        return (Some(key), entry[eq + 1..].trim());
    }
    (None, entry)
}

/// Byte offset of the `}` matching the `{` at `open`, skipping strings.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, b) in text.bytes().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_inline(body: &str) -> TableLiteral {
    let entries = split_top_level(body, &[',', ';'])
        .into_iter()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|entry| {
            let (key, value) = classify(entry);
            TableEntry {
                key: key.map(|k| lower_inline(&k)),
                value: TableValue::Raw(lower_inline(value)),
            }
        })
        .collect();
    TableLiteral { entries }
}

/// Rewrite every balanced `{...}` constructor on one line.
///
/// Unbalanced braces are left as they are. Entry values are lowered but not
/// otherwise rewritten; the caller's rules see the whole lowered line.
pub fn lower_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(open) = find_code_brace(rest) else {
            out.push_str(rest);
            return out;
        };
        let Some(close) = matching_brace(rest, open) else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..open]);
        out.push_str(&parse_inline(&rest[open + 1..close]).render_inline(&mut |s| s.to_string()));
        rest = &rest[close + 1..];
    }
}

fn find_code_brace(text: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, b) in text.bytes().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'{' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Result of parsing a multi-line table constructor.
#[derive(Debug, Clone)]
pub struct TableParse {
    pub literal: TableLiteral,
    /// First line after the closing brace.
    pub next: usize,
    /// Code after the closing brace on its line.
    pub trailing: String,
}

#[derive(Default)]
struct Piece {
    text: String,
    prefix: String,
    nested: Option<TableLiteral>,
}

impl Piece {
    fn finish(self, literal: &mut TableLiteral) {
        if let Some(nested) = self.nested {
            let prefix = self.prefix.trim();
            let key = prefix
                .strip_suffix('=')
                .and_then(classify_key);
            literal.entries.push(TableEntry {
                key,
                value: TableValue::Table(nested),
            });
            return;
        }
        let text = self.text.trim();
        if text.is_empty() {
            return;
        }
        let (key, value) = classify(text);
        literal.entries.push(TableEntry {
            key,
            value: TableValue::Raw(value.to_string()),
        });
    }
}

struct Parser<'a> {
    lines: &'a [SourceLine],
    line: usize,
    diagnostics: &'a mut Diagnostics,
}

impl Parser<'_> {
    /// Parse entries until the matching `}`. Returns the literal and the text
    /// after the brace, or `None` for the text when input ran out.
    fn body(&mut self, text: &str) -> (TableLiteral, Option<String>) {
        let open_line = self.line;
        let open_indent = self.lines[open_line].indent;
        let mut literal = TableLiteral::default();
        let mut piece = Piece::default();
        let mut current = split_comment(text).0.to_string();
        let mut pos = 0;
        let mut depth = 0i32;

        loop {
            let bytes = current.as_bytes();
            while pos < bytes.len() {
                let b = bytes[pos];
                match b {
                    b'"' | b'\'' => {
                        let mut end = pos + 1;
                        while end < bytes.len() && bytes[end] != b {
                            end += if bytes[end] == b'\\' { 2 } else { 1 };
                        }
                        let stop = (end + 1).min(bytes.len());
                        piece.text.push_str(&current[pos..stop]);
                        pos = stop;
                        continue;
                    }
                    b'{' if depth == 0 => {
                        let after = current[pos + 1..].to_string();
                        let (nested, rest) = self.body(&after);
                        piece.prefix = std::mem::take(&mut piece.text);
                        piece.nested = Some(nested);
                        match rest {
                            Some(rest) => {
                                current = rest;
                                pos = 0;
                            }
                            None => {
                                piece.finish(&mut literal);
                                return (literal, None);
                            }
                        }
                        break;
                    }
                    b'}' if depth == 0 => {
                        std::mem::take(&mut piece).finish(&mut literal);
                        let line = &self.lines[self.line];
                        if self.line != open_line
                            && line.stripped.starts_with('}')
                            && line.indent > open_indent
                        {
                            self.diagnostics.push(
                                Diagnostic::new(
                                    DiagnosticKind::MisalignedCloser,
                                    format!(
                                        "closing brace is indented deeper than the table opened on line {}",
                                        open_line + 1
                                    ),
                                )
                                .at(self.line + 1),
                            );
                        }
                        return (literal, Some(current[pos + 1..].to_string()));
                    }
                    b',' | b';' if depth == 0 => {
                        std::mem::take(&mut piece).finish(&mut literal);
                    }
                    _ => {
                        match b {
                            b'(' | b'[' | b'{' => depth += 1,
                            b')' | b']' | b'}' => depth -= 1,
                            _ => {}
                        }
                        let len = current[pos..].chars().next().map_or(1, char::len_utf8);
                        piece.text.push_str(&current[pos..pos + len]);
                        pos += len;
                        continue;
                    }
                }
                pos += 1;
            }
            if pos < current.len() {
                continue;
            }

            self.line += 1;
            if self.line >= self.lines.len() {
                piece.finish(&mut literal);
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::UnterminatedLiteral,
                        "table constructor is never closed",
                    )
                    .at(open_line + 1),
                );
                return (literal, None);
            }
            piece.text.push(' ');
            current = split_comment(&self.lines[self.line].stripped).0.to_string();
            pos = 0;
        }
    }
}

/// Parse a constructor whose `{` sits on line `start`; `after_brace` is the
/// text following that brace.
pub fn parse(
    lines: &[SourceLine],
    start: usize,
    after_brace: &str,
    diagnostics: &mut Diagnostics,
) -> TableParse {
    let mut parser = Parser {
        lines,
        line: start,
        diagnostics,
    };
    let (literal, rest) = parser.body(after_brace);
    TableParse {
        literal,
        next: (parser.line + 1).min(lines.len()),
        trailing: rest.unwrap_or_default().trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<SourceLine> {
        text.lines().map(SourceLine::new).collect()
    }

    fn identity(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn positional_body_is_a_list() {
        assert_eq!(lower_inline("t = {1, 2, 3}"), "t = [1, 2, 3]");
    }

    #[test]
    fn keyed_body_is_a_dict() {
        assert_eq!(
            lower_inline(r#"t = {name = "x", [5] = true}"#),
            r#"t = {'name': "x", 5: true}"#
        );
    }

    #[test]
    fn mixed_body_gives_positional_entries_their_index() {
        assert_eq!(lower_inline("t = {10, x = 1, 20}"), "t = {1: 10, 'x': 1, 2: 20}");
    }

    #[test]
    fn empty_and_nested() {
        assert_eq!(lower_inline("t = {}"), "t = []");
        assert_eq!(lower_inline("t = {{1}, {a = 2}}"), "t = [[1], {'a': 2}]");
    }

    #[test]
    fn comparisons_are_not_keys() {
        assert_eq!(lower_inline("t = {a == b}"), "t = [a == b]");
    }

    #[test]
    fn multi_line_constructor() {
        let src = lines("local t = {\n  1,\n  2,\n}\nprint(t)");
        let mut diagnostics = Diagnostics::default();
        let parsed = parse(&src, 0, "", &mut diagnostics);
        assert_eq!(parsed.next, 4);
        assert!(!parsed.literal.is_mapping());
        assert_eq!(
            parsed.literal.render_block("t = ", 0, 4, &mut identity),
            vec!["t = [", "    1,", "    2,", "]"]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn nested_multi_line_constructor() {
        let src = lines(
            "config = {\n  name = \"demo\", -- label\n  sizes = {\n    1, 2,\n  },\n  { x = 1 },\n}",
        );
        let mut diagnostics = Diagnostics::default();
        let parsed = parse(&src, 0, "", &mut diagnostics);
        assert_eq!(parsed.next, 7);
        assert_eq!(
            parsed.literal.render_block("config = ", 0, 4, &mut identity),
            vec![
                "config = {",
                "    'name': \"demo\",",
                "    'sizes': [",
                "        1,",
                "        2,",
                "    ],",
                "    1: {",
                "        'x': 1,",
                "    },",
                "}",
            ]
        );
    }

    #[test]
    fn mixed_multi_line_body_is_mapping() {
        let src = lines("t = {\n  \"a\",\n  [\"k\"] = 2,\n}");
        let mut diagnostics = Diagnostics::default();
        let parsed = parse(&src, 0, "", &mut diagnostics);
        assert!(parsed.literal.is_mapping());
        assert_eq!(
            parsed.literal.render_inline(&mut identity),
            r#"{1: "a", "k": 2}"#
        );
    }

    #[test]
    fn trailing_text_after_brace() {
        let src = lines("f({\n  1,\n})");
        let mut diagnostics = Diagnostics::default();
        let parsed = parse(&src, 0, "", &mut diagnostics);
        assert_eq!(parsed.trailing, ")");
    }

    #[test]
    fn unterminated_constructor_is_diagnosed() {
        let src = lines("t = {\n  1,\n  2");
        let mut diagnostics = Diagnostics::default();
        let parsed = parse(&src, 0, "", &mut diagnostics);
        assert_eq!(parsed.next, 3);
        assert_eq!(parsed.literal.entries.len(), 2);
        assert_eq!(diagnostics.count(DiagnosticKind::UnterminatedLiteral), 1);
    }
}
