//! Line-oriented translation of Lua source into Python source.
//!
//! `luapy-convert` is a best-effort structural translator, not a compiler:
//! it walks the input one line at a time, tracks open blocks on an explicit
//! stack, and rewrites expressions with ordered regex rules.
//!
//! # Architecture
//!
//! ```text
//! SourceInput ─> Converter (block stack) ─┬─> literal   multi-line [[ ]] / --[[ ]]
//!                                         ├─> table     { ... } constructors
//!                                         ├─> rewrite   general ─> object API ─> memory API
//!                                         └─> scope     global / nonlocal declarations
//!                          ─> imports + diagnostics ─> Conversion
//! ```
//!
//! # Example
//!
//! ```ignore
//! use luapy_convert::{ConvertOptions, convert};
//!
//! let out = convert("local x = 1\nif x == 1 then\n  print(x)\nend", ConvertOptions::default())?;
//! assert_eq!(out.text, "x = 1\nif x == 1:\n    print(x)\n");
//! ```
//!
//! # Fidelity
//!
//! Conversion never fails once the input is decoded. Anything the converter
//! cannot place (unterminated literals, stray `end`, unknown `goto` labels)
//! becomes a [`Diagnostic`], rendered as a `# Warnings:` block at the top of
//! the output. Unrecognized statements pass through the rewrite rules and are
//! emitted as they come out.

pub mod convert;
pub mod diagnostics;
pub mod emit;
pub mod goto;
pub mod imports;
pub mod literal;
pub mod rewrite;
pub mod scan;
pub mod scope;
pub mod source;
pub mod table;

pub use convert::{Conversion, ConvertOptions, Converter, FrameKind};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use rewrite::{GotoTarget, RewriteContext, RewriteEngine, RuleError};
pub use source::{DEFAULT_MAX_LINES, SourceInput, SourceLine};

/// Convert Lua source text with the shared rule tables.
pub fn convert(source: &str, options: ConvertOptions) -> Result<Conversion, RuleError> {
    let engine = RewriteEngine::shared()?;
    let converter = Converter::new(engine, options)?;
    Ok(converter.convert(&SourceInput::from_text(source, DEFAULT_MAX_LINES)))
}
