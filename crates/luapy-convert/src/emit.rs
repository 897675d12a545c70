//! Python line writer.
//!
//! Output is kept as a list of lines so that declarations can be inserted
//! after a function header once its body has been seen.

/// Accumulates indented Python lines.
#[derive(Debug, Clone)]
pub struct PythonWriter {
    lines: Vec<String>,
    indent_width: usize,
}

impl PythonWriter {
    pub fn new(indent_width: usize) -> Self {
        Self {
            lines: Vec::new(),
            indent_width,
        }
    }

    fn indent(&self, depth: usize) -> String {
        " ".repeat(depth * self.indent_width)
    }

    /// Append `text` at `depth`.
    pub fn line(&mut self, depth: usize, text: &str) {
        let line = format!("{}{}", self.indent(depth), text);
        self.lines.push(line);
    }

    /// Append an already indented line.
    pub fn raw(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Insert `text` at `depth` before position `index`.
    pub fn insert(&mut self, index: usize, depth: usize, text: &str) {
        let line = format!("{}{}", self.indent(depth), text);
        self.lines.insert(index.min(self.lines.len()), line);
    }

    /// Index the next written line will occupy.
    pub fn next_index(&self) -> usize {
        self.lines.len()
    }

    /// Whether any statement (not blank, not a comment) sits at or after `start`.
    pub fn has_code_since(&self, start: usize) -> bool {
        self.lines.iter().skip(start).any(|line| {
            let line = line.trim_start();
            !line.is_empty() && !line.starts_with('#')
        })
    }

    pub fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_indented_by_depth() {
        let mut writer = PythonWriter::new(4);
        writer.line(0, "if x:");
        writer.line(1, "y()");
        writer.insert(1, 1, "global y");
        assert_eq!(writer.next_index(), 3);
        assert_eq!(writer.finish(), "if x:\n    global y\n    y()\n");
    }

    #[test]
    fn comments_are_not_code() {
        let mut writer = PythonWriter::new(2);
        writer.line(0, "def f():");
        writer.line(1, "# note");
        writer.blank();
        assert!(!writer.has_code_since(1));
        writer.line(1, "return 1");
        assert!(writer.has_code_since(1));
    }
}
