//! Configuration for luapy.
//!
//! Loads config from:
//! 1. Global: ~/.config/luapy/config.toml
//! 2. Per-project: .luapy/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! [convert]
//! protect_strings = true  # never rewrite inside string literals
//! indent_width = 4        # spaces per Python indentation level
//! max_lines = 3000000     # warn above this many input lines
//! ```

use luapy_convert::{ConvertOptions, DEFAULT_MAX_LINES};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Conversion settings. Unset fields fall back to the built-in defaults.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ConvertConfig {
    pub protect_strings: Option<bool>,
    pub indent_width: Option<usize>,
    pub max_lines: Option<usize>,
}

impl ConvertConfig {
    pub fn protect_strings(&self) -> bool {
        self.protect_strings.unwrap_or(true)
    }

    pub fn indent_width(&self) -> usize {
        self.indent_width.unwrap_or(4)
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines.unwrap_or(DEFAULT_MAX_LINES)
    }

    pub fn options(&self) -> ConvertOptions {
        ConvertOptions {
            indent_width: self.indent_width(),
            protect_strings: self.protect_strings(),
        }
    }

    /// Fields set in `other` win.
    fn merge(self, other: Self) -> Self {
        Self {
            protect_strings: other.protect_strings.or(self.protect_strings),
            indent_width: other.indent_width.or(self.indent_width),
            max_lines: other.max_lines.or(self.max_lines),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LuapyConfig {
    pub convert: ConvertConfig,
}

impl LuapyConfig {
    /// Load global config, then the project config under `root` on top.
    pub fn load(root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path()
            && let Some(global) = Self::load_file(&global_path)
        {
            config = config.merge(global);
        }

        let project_path = root.join(".luapy").join("config.toml");
        if let Some(project) = Self::load_file(&project_path) {
            config = config.merge(project);
        }

        config
    }

    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("luapy").join("config.toml"))
    }

    fn load_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring invalid config: {e}");
                None
            }
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            convert: self.convert.merge(other.convert),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_project_config(dir: &TempDir, content: &str) {
        let luapy_dir = dir.path().join(".luapy");
        std::fs::create_dir_all(&luapy_dir).unwrap();
        let mut file = std::fs::File::create(luapy_dir.join("config.toml")).unwrap();
        writeln!(file, "{content}").unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = LuapyConfig::default();
        assert!(config.convert.protect_strings());
        assert_eq!(config.convert.indent_width(), 4);
        assert_eq!(config.convert.max_lines(), DEFAULT_MAX_LINES);
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        write_project_config(
            &dir,
            r#"
[convert]
protect_strings = false
indent_width = 2
"#,
        );
        let config = LuapyConfig::load(dir.path());
        assert!(!config.convert.protect_strings());
        assert_eq!(config.convert.indent_width(), 2);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        write_project_config(&dir, "[convert]\nmax_lines = 10\n");
        let config = LuapyConfig::load(dir.path());
        assert_eq!(config.convert.max_lines(), 10);
        assert!(config.convert.protect_strings());
        assert_eq!(config.convert.indent_width(), 4);
    }

    #[test]
    fn test_merge_prefers_set_fields() {
        let global = ConvertConfig {
            protect_strings: Some(false),
            indent_width: Some(8),
            max_lines: None,
        };
        let project = ConvertConfig {
            indent_width: Some(2),
            ..ConvertConfig::default()
        };
        let merged = global.merge(project);
        assert_eq!(merged.protect_strings, Some(false));
        assert_eq!(merged.indent_width, Some(2));
    }
}
