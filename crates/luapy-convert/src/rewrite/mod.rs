//! Ordered pattern rewriting of Lua expressions into Python.
//!
//! The engine owns three immutable rule tables and applies them in a fixed
//! order to every statement:
//!
//! ```text
//! line ─> mask strings ─> inline tables ─> general ─> object API ─> memory API ─> unmask
//! ```
//!
//! Rules are cumulative: each sees the output of the one before it, and a rule
//! that does not match leaves the line untouched. Per-run bookkeeping (API
//! usage, labels, metatables, `require`d modules) lives in [`RewriteContext`],
//! never in the engine, so one engine can serve any number of conversions.

mod general;
pub(crate) mod mask;
mod memory_api;
mod object_api;

use regex::{Captures, Regex, RegexBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Callback form of a replacement.
pub type RewriteFn = fn(&Captures<'_>, &mut RewriteContext) -> String;

/// How a matched rule produces its output.
#[derive(Clone, Copy)]
pub enum Replacement {
    /// `regex` replacement template (`${1}` refers to group 1).
    Template(&'static str),
    /// Computed from the captures; may record into the context.
    Func(RewriteFn),
}

/// Static description of a rule, compiled into a [`Rule`] by the engine.
#[derive(Clone, Copy)]
pub struct RuleSpec {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: Replacement,
    /// Skip this rule when rewriting `if`/`while` conditions.
    pub statement_only: bool,
}

impl RuleSpec {
    pub const fn template(name: &'static str, pattern: &'static str, to: &'static str) -> Self {
        Self {
            name,
            pattern,
            replacement: Replacement::Template(to),
            statement_only: false,
        }
    }

    pub const fn func(name: &'static str, pattern: &'static str, f: RewriteFn) -> Self {
        Self {
            name,
            pattern,
            replacement: Replacement::Func(f),
            statement_only: false,
        }
    }

    pub const fn statement_only(mut self) -> Self {
        self.statement_only = true;
        self
    }
}

/// Which table a rule belongs to; decides what usage gets recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Namespace {
    General,
    ObjectApi,
    MemoryApi,
}

/// A compiled rule.
pub struct Rule {
    pub name: &'static str,
    pub namespace: Namespace,
    regex: Regex,
    replacement: Replacement,
    statement_only: bool,
}

impl Rule {
    fn apply(&self, text: &str, ctx: &mut RewriteContext) -> Option<String> {
        if !self.regex.is_match(text) {
            return None;
        }
        match self.namespace {
            Namespace::General => {}
            Namespace::ObjectApi => {
                ctx.object_api.insert(self.name);
            }
            Namespace::MemoryApi => {
                ctx.memory_api.insert(self.name);
            }
        }
        let out = match self.replacement {
            Replacement::Template(template) => self.regex.replace_all(text, template).into_owned(),
            Replacement::Func(f) => self
                .regex
                .replace_all(text, |caps: &Captures<'_>| f(caps, ctx))
                .into_owned(),
        };
        Some(out)
    }
}

/// Error building the rule tables.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuleError {
    #[error("rule `{name}` has an invalid pattern: {source}")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// A `goto` seen during conversion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GotoTarget {
    /// Source line (1-indexed) of the `goto`.
    pub line: usize,
    pub label: String,
}

/// Mutable state of one conversion run, threaded through every rule.
#[derive(Debug, Default)]
pub struct RewriteContext {
    protect_strings: bool,
    strings: Vec<String>,
    /// Source line (1-indexed) currently being rewritten.
    pub line: usize,
    /// Output position the current statement will be emitted at.
    pub position: usize,
    /// Object-scripting rules that fired.
    pub object_api: BTreeSet<&'static str>,
    /// Memory-automation rules that fired.
    pub memory_api: BTreeSet<&'static str>,
    /// Modules pulled in with `require`.
    pub required_modules: BTreeSet<String>,
    /// Table name to its most recent metatable literal.
    pub metatables: BTreeMap<String, String>,
    /// Label name to the output position of its marker.
    pub labels: BTreeMap<String, usize>,
    pub gotos: Vec<GotoTarget>,
}

impl RewriteContext {
    pub fn new(protect_strings: bool) -> Self {
        Self {
            protect_strings,
            ..Self::default()
        }
    }

    /// Hide a literal body from later rules; returns the text to splice in.
    pub fn stash(&mut self, body: &str) -> String {
        if !self.protect_strings {
            return body.to_string();
        }
        self.strings.push(body.to_string());
        mask::token(self.strings.len() - 1)
    }

    /// Recover the original text of a (possibly) masked fragment.
    pub fn reveal(&self, text: &str) -> String {
        mask::unmask(text, &self.strings)
    }

    fn mask(&mut self, text: &str) -> String {
        self.strings.clear();
        mask::mask(text, |body| self.stash(body))
    }
}

/// The three ordered rule tables.
pub struct RewriteEngine {
    general: Vec<Rule>,
    object_api: Vec<Rule>,
    memory_api: Vec<Rule>,
}

static SHARED: OnceLock<Result<RewriteEngine, RuleError>> = OnceLock::new();

impl RewriteEngine {
    pub fn new() -> Result<Self, RuleError> {
        Ok(Self {
            general: compile(general::RULES, Namespace::General, false)?,
            object_api: compile(object_api::RULES, Namespace::ObjectApi, true)?,
            memory_api: compile(memory_api::RULES, Namespace::MemoryApi, false)?,
        })
    }

    /// Process-wide engine, compiled on first use.
    pub fn shared() -> Result<&'static RewriteEngine, RuleError> {
        match SHARED.get_or_init(RewriteEngine::new) {
            Ok(engine) => Ok(engine),
            Err(e) => Err(e.clone()),
        }
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.general
            .iter()
            .chain(&self.object_api)
            .chain(&self.memory_api)
    }

    /// Rewrite one statement.
    pub fn rewrite(&self, text: &str, ctx: &mut RewriteContext) -> String {
        self.run(text, ctx, false)
    }

    /// Rewrite a condition or loop header expression.
    pub fn rewrite_condition(&self, text: &str, ctx: &mut RewriteContext) -> String {
        self.run(text, ctx, true)
    }

    fn run(&self, text: &str, ctx: &mut RewriteContext, condition: bool) -> String {
        let mut code = ctx.mask(text);
        code = crate::table::lower_inline(&code);
        for rule in self.rules() {
            if condition && rule.statement_only {
                continue;
            }
            if let Some(out) = rule.apply(&code, ctx) {
                code = out;
            }
        }
        ctx.reveal(&code)
    }
}

fn compile(
    specs: &[RuleSpec],
    namespace: Namespace,
    case_insensitive: bool,
) -> Result<Vec<Rule>, RuleError> {
    specs
        .iter()
        .map(|spec| {
            let regex = RegexBuilder::new(spec.pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|source| RuleError::Pattern {
                    name: spec.name,
                    source,
                })?;
            Ok(Rule {
                name: spec.name,
                namespace,
                regex,
                replacement: spec.replacement,
                statement_only: spec.statement_only,
            })
        })
        .collect()
}

/// Text of an optional capture group, trimmed; empty when absent.
pub(crate) fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map(|m| m.as_str().trim()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(line: &str) -> String {
        let engine = RewriteEngine::new().unwrap();
        let mut ctx = RewriteContext::new(true);
        engine.rewrite(line, &mut ctx)
    }

    #[test]
    fn all_tables_compile() {
        let engine = RewriteEngine::new().unwrap();
        assert!(engine.rules().count() > 100);
    }

    #[test]
    fn shared_engine_is_reused() {
        let a = RewriteEngine::shared().unwrap() as *const _;
        let b = RewriteEngine::shared().unwrap() as *const _;
        assert_eq!(a, b);
    }

    #[test]
    fn unmatched_line_passes_through() {
        assert_eq!(rewrite("x = y + 1"), "x = y + 1");
    }

    #[test]
    fn strings_are_protected_by_default() {
        assert_eq!(rewrite(r#"print("nil ~= true")"#), r#"print("nil ~= true")"#);
    }

    #[test]
    fn raw_mode_rewrites_inside_strings() {
        let engine = RewriteEngine::new().unwrap();
        let mut ctx = RewriteContext::new(false);
        assert_eq!(
            engine.rewrite(r#"print("nil ~= true")"#, &mut ctx),
            r#"print("None != True")"#
        );
    }

    #[test]
    fn conditions_skip_default_idiom() {
        let engine = RewriteEngine::new().unwrap();
        let mut ctx = RewriteContext::new(true);
        assert_eq!(engine.rewrite_condition("a or b", &mut ctx), "a or b");
        assert_eq!(
            engine.rewrite("x = a or b", &mut ctx),
            "x = a if a is not None else b"
        );
    }
}
