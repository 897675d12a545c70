//! Reading Lua source files into decoded lines.

use encoding_rs::{Encoding, WINDOWS_1251, WINDOWS_1252};
use luapy_convert::SourceInput;
use std::path::{Path, PathBuf};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors reading an input file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Single-byte codepages tried, in order, after strict UTF-8.
static LEGACY: &[&Encoding] = &[WINDOWS_1251, WINDOWS_1252];

/// Decode raw bytes. Never fails: strict UTF-8, then the legacy codepages,
/// then UTF-8 with invalid bytes replaced.
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) => decode_legacy(bytes).unwrap_or_else(|| {
            tracing::warn!(
                offset = e.valid_up_to(),
                "input is not valid UTF-8, replacing invalid bytes"
            );
            String::from_utf8_lossy(bytes).into_owned()
        }),
    };
    normalize_newlines(&text)
}

fn decode_legacy(bytes: &[u8]) -> Option<String> {
    LEGACY.iter().find_map(|encoding| {
        let text = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;
        tracing::debug!(encoding = encoding.name(), "decoded legacy input");
        Some(text.into_owned())
    })
}

/// CRLF and lone CR become LF.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Read and decode `path`.
pub fn load(path: &Path, max_lines: usize) -> Result<SourceInput, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let input = SourceInput::from_text(&decode(&bytes), max_lines);
    tracing::debug!(path = %path.display(), lines = input.len(), "loaded");
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn strips_bom_and_normalizes_newlines() {
        assert_eq!(decode(b"\xEF\xBB\xBFa\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn cp1251_text_keeps_cyrillic() {
        assert_eq!(
            decode(b"print(\"\xcf\xf0\xe8\xe2\xe5\xf2\")\r\n"),
            "print(\"\u{41f}\u{440}\u{438}\u{432}\u{435}\u{442}\")\n"
        );
    }

    #[test]
    fn bytes_outside_cp1251_fall_through_to_cp1252() {
        assert_eq!(decode(b"s = '\x98'"), "s = '\u{2dc}'");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("missing.lua"), 10).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn oversized_input_is_flagged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.lua");
        std::fs::write(&path, "a = 1\nb = 2\nc = 3\n").unwrap();
        let input = load(&path, 2).unwrap();
        assert_eq!(input.len(), 3);
        assert!(input.oversized);
    }
}
