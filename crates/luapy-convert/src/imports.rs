//! Support imports and helper shims, inferred from the emitted body.
//!
//! Inference is a presence scan over the final text rather than provenance
//! tracking: if `random.` appears anywhere, `import random` is required.

use crate::rewrite::RuleError;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// `(directive, pattern)` checked against the body.
const MODULES: &[(&str, &str)] = &[
    ("import time", r"(^|[^.\w])time\.|\b(sleep|strftime|mktime|perf_counter)\("),
    ("import random", r"(^|[^.\w])random\."),
    ("import threading", r"(^|[^.\w])threading\."),
    ("import math", r"(^|[^.\w])math\."),
    ("import re", r"(^|[^.\w])re\."),
    ("import gc", r"(^|[^.\w])gc\."),
    ("import traceback", r"(^|[^.\w])traceback\."),
    ("import functools", r"(^|[^.\w])functools\."),
    (
        "from typing import Any, Dict, Generator, List, Tuple",
        r"\b(struct_time|Generator)\b|\b(Dict|List)\[",
    ),
];

const SHIM_NAMES: &[&str] = &[
    "__pcall_wrapper",
    "__xpcall_wrapper",
    "__assert_wrapper",
    "__yield",
    "__coroutine_wrap",
    "__getupvalue",
    "__setupvalue",
    "__getfenv",
    "__setfenv",
    "__debug_getinfo",
];

const SHIMS: &str = r#"def __pcall_wrapper(fn, *args):
    try:
        return True, fn(*args)
    except Exception as e:
        return False, str(e)


def __xpcall_wrapper(fn, handler, *args):
    try:
        return True, fn(*args)
    except Exception as e:
        return False, handler(e)


def __assert_wrapper(value, message="assertion failed!"):
    if not value:
        raise AssertionError(message)
    return value


def __yield(*values):
    return values[0] if len(values) == 1 else values


def __coroutine_wrap(fn):
    def resume(*args):
        return fn(*args)
    return resume


def __getupvalue(fn, index):
    cells = fn.__closure__ or ()
    if 0 < index <= len(cells):
        return fn.__code__.co_freevars[index - 1], cells[index - 1].cell_contents
    return None


def __setupvalue(fn, index, value):
    cells = fn.__closure__ or ()
    if 0 < index <= len(cells):
        cells[index - 1].cell_contents = value
        return fn.__code__.co_freevars[index - 1]
    return None


def __getfenv(fn=None):
    return globals()


def __setfenv(fn, env):
    globals().update(env)
    return fn


def __debug_getinfo(*_):
    import inspect
    frame = inspect.currentframe().f_back
    return {"currentline": frame.f_lineno, "source": frame.f_code.co_filename}
"#;

const METATABLE_SHIMS: &str = r#"__metatables = {}


def __setmetatable(table, meta):
    __metatables[id(table)] = meta
    return table


def __getmetatable(table):
    return __metatables.get(id(table))
"#;

/// Compiled module-usage patterns.
pub struct ImportScanner {
    modules: Vec<(&'static str, Regex)>,
}

static SHARED: OnceLock<Result<ImportScanner, RuleError>> = OnceLock::new();

impl ImportScanner {
    pub fn new() -> Result<Self, RuleError> {
        let modules = MODULES
            .iter()
            .map(|&(directive, pattern)| {
                Regex::new(pattern)
                    .map(|re| (directive, re))
                    .map_err(|source| RuleError::Pattern {
                        name: directive,
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { modules })
    }

    /// Process-wide scanner, compiled on first use.
    pub fn shared() -> Result<&'static ImportScanner, RuleError> {
        match SHARED.get_or_init(ImportScanner::new) {
            Ok(scanner) => Ok(scanner),
            Err(e) => Err(e.clone()),
        }
    }

    /// Sorted, unique import directives the body needs.
    pub fn required_imports(&self, body: &str, object_api: bool, memory_api: bool) -> Vec<String> {
        let mut directives: BTreeSet<&str> = self
            .modules
            .iter()
            .filter(|(_, re)| re.is_match(body))
            .map(|(directive, _)| *directive)
            .collect();
        if memory_api {
            directives.insert("import gg");
        }
        if object_api {
            directives.insert("from enum import Enum");
        }
        directives.into_iter().map(str::to_string).collect()
    }
}

/// Helper definitions the body calls into.
pub fn shims(body: &str) -> Vec<&'static str> {
    let mut out = Vec::new();
    if SHIM_NAMES.iter().any(|name| body.contains(name)) {
        out.push(SHIMS);
    }
    if body.contains("__setmetatable") || body.contains("__getmetatable") {
        out.push(METATABLE_SHIMS);
    }
    out
}

/// Join warnings, imports, shims and body into the final text.
pub fn assemble(warnings: &str, imports: &[String], shims: &[&str], body: &str) -> String {
    let mut out = String::from(warnings);
    for directive in imports {
        out.push_str(directive);
        out.push('\n');
    }
    if !imports.is_empty() {
        out.push('\n');
    }
    for shim in shims {
        out.push_str(shim);
        out.push_str("\n\n");
    }
    out.push_str(body);
    out
}
