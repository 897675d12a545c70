//! Decoded input lines.

/// Line-count threshold past which input is flagged as oversized.
pub const DEFAULT_MAX_LINES: usize = 3_000_000;

/// One physical line of Lua source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// The line as read, without its terminator.
    pub raw: String,
    /// Leading whitespace width in characters.
    pub indent: usize,
    /// The line with surrounding whitespace removed.
    pub stripped: String,
}

impl SourceLine {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim_start();
        let indent = raw[..raw.len() - trimmed.len()].chars().count();
        let stripped = trimmed.trim_end().to_string();
        Self {
            raw,
            indent,
            stripped,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.stripped.is_empty()
    }
}

/// The full ordered input of one conversion.
#[derive(Debug, Clone, Default)]
pub struct SourceInput {
    pub lines: Vec<SourceLine>,
    /// Set when the line count exceeded the configured threshold.
    pub oversized: bool,
}

impl SourceInput {
    pub fn from_lines<I, S>(lines: I, max_lines: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<SourceLine> = lines.into_iter().map(SourceLine::new).collect();
        let oversized = lines.len() > max_lines;
        Self { lines, oversized }
    }

    /// Split already-normalized text on `\n`.
    pub fn from_text(text: &str, max_lines: usize) -> Self {
        Self::from_lines(text.lines(), max_lines)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
