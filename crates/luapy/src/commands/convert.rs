//! Convert command - translate a Lua script into Python.

use crate::config::LuapyConfig;
use crate::loader;
use clap::Args;
use luapy_convert::{Conversion, Converter, RewriteEngine};
use std::path::{Path, PathBuf};

/// Convert command arguments
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input Lua file
    pub input: PathBuf,

    /// Output file (input path with a .py extension if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print a JSON report on stdout
    #[arg(long)]
    pub json: bool,

    /// Apply rewrite rules inside string literals too
    #[arg(long)]
    pub no_protect_strings: bool,

    /// Spaces per indentation level
    #[arg(long, value_name = "N")]
    pub indent: Option<usize>,
}

/// Default output location: the input with its extension replaced by `.py`.
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("py")
}

fn write_output(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)
}

fn report(input: &Path, output: &Path, conversion: &Conversion) -> serde_json::Value {
    serde_json::json!({
        "input": input.display().to_string(),
        "output": output.display().to_string(),
        "diagnostics": conversion.diagnostics,
        "imports": conversion.imports,
    })
}

/// Run the convert command
pub fn run(args: ConvertArgs, config: &LuapyConfig) -> i32 {
    let mut options = config.convert.options();
    if args.no_protect_strings {
        options.protect_strings = false;
    }
    if let Some(width) = args.indent {
        options.indent_width = width;
    }

    let input = match loader::load(&args.input, config.convert.max_lines()) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    let converter = match RewriteEngine::shared().and_then(|engine| Converter::new(engine, options))
    {
        Ok(converter) => converter,
        Err(e) => {
            eprintln!("Failed to build rewrite rules: {}", e);
            return 1;
        }
    };
    let conversion = converter.convert(&input);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));
    if let Err(e) = write_output(&output, &conversion.text) {
        eprintln!("Failed to write {}: {}", output.display(), e);
        return 1;
    }

    if args.json {
        let report = report(&args.input, &output, &conversion);
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
    }

    eprintln!(
        "Translated {} -> {}",
        args.input.display(),
        output.display()
    );
    if !conversion.diagnostics.is_empty() {
        eprintln!("Warnings: {}", conversion.diagnostics.len());
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(input: PathBuf, output: Option<PathBuf>) -> ConvertArgs {
        ConvertArgs {
            input,
            output,
            json: false,
            no_protect_strings: false,
            indent: None,
        }
    }

    #[test]
    fn test_default_output_swaps_extension() {
        assert_eq!(
            default_output(Path::new("scripts/hack.lua")),
            PathBuf::from("scripts/hack.py")
        );
        assert_eq!(default_output(Path::new("plain")), PathBuf::from("plain.py"));
    }

    #[test]
    fn test_missing_input_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("absent.lua");
        let code = run(args(input, None), &LuapyConfig::default());
        assert_eq!(code, 1);
        assert!(!dir.path().join("absent.py").exists());
    }

    #[test]
    fn test_writes_into_new_directory() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("main.lua");
        std::fs::write(&input, "local x = 1\r\nif x then\r\n  print(x)\r\nend\r\n").unwrap();
        let output = dir.path().join("out").join("main.py");

        let code = run(args(input, Some(output.clone())), &LuapyConfig::default());
        assert_eq!(code, 0);
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "x = 1\nif x:\n    print(x)\n"
        );
    }

    #[test]
    fn test_flags_override_config() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("loop.lua");
        std::fs::write(&input, "while true do\n  step()\nend\n").unwrap();

        let mut convert_args = args(input.clone(), None);
        convert_args.indent = Some(2);
        assert_eq!(run(convert_args, &LuapyConfig::default()), 0);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("loop.py")).unwrap(),
            "while True:\n  step()\n"
        );
    }
}
