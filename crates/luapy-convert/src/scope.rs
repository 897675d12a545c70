//! Lexical scopes and the declarations Python needs for them.
//!
//! Lua assigns to globals unless a name was declared `local`, while Python
//! makes every assigned name local to its function. A [`Scope`] records what
//! each function declares so the converter can emit `global`/`nonlocal`
//! statements for names it assigns but does not own.

use std::collections::{BTreeMap, BTreeSet};

/// One function body (or the module).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub locals: BTreeSet<String>,
    /// Assigned here, owned by the module or unknown (Lua globals).
    pub globals: BTreeSet<String>,
    /// Assigned here, owned by an enclosing function.
    pub nonlocals: BTreeSet<String>,
    /// Function name to its 1-indexed definition line.
    pub functions: BTreeMap<String, usize>,
    /// 1-indexed line the scope opened on.
    pub line_start: usize,
}

impl Scope {
    pub fn new(line_start: usize) -> Self {
        Self {
            line_start,
            ..Self::default()
        }
    }

    pub fn declare(&mut self, name: &str) {
        self.locals.insert(name.to_string());
    }

    pub fn define_function(&mut self, name: &str, line: usize) {
        self.functions.insert(name.to_string(), line);
    }

    pub fn declares(&self, name: &str) -> bool {
        self.locals.contains(name) || self.functions.contains_key(name)
    }

    /// Declaration lines to place at the top of the function body.
    pub fn declarations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.globals.is_empty() {
            out.push(format!("global {}", join(&self.globals)));
        }
        if !self.nonlocals.is_empty() {
            out.push(format!("nonlocal {}", join(&self.nonlocals)));
        }
        out
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Record an assignment to `name` made in `current`, given the enclosing
/// function scopes from innermost to outermost.
pub fn note_assignment<'a>(
    current: &mut Scope,
    mut enclosing: impl Iterator<Item = &'a Scope>,
    name: &str,
) {
    if current.declares(name) {
        return;
    }
    if enclosing.any(|scope| scope.declares(name)) {
        current.nonlocals.insert(name.to_string());
    } else {
        current.globals.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_locals_need_no_declaration() {
        let mut scope = Scope::new(1);
        scope.declare("x");
        note_assignment(&mut scope, std::iter::empty(), "x");
        assert!(scope.declarations().is_empty());
    }

    #[test]
    fn enclosing_function_local_is_nonlocal() {
        let mut outer = Scope::new(1);
        outer.declare("count");
        let mut inner = Scope::new(3);
        note_assignment(&mut inner, [&outer].into_iter(), "count");
        note_assignment(&mut inner, [&outer].into_iter(), "total");
        assert_eq!(
            inner.declarations(),
            vec!["global total".to_string(), "nonlocal count".to_string()]
        );
    }

    #[test]
    fn functions_count_as_declared() {
        let mut scope = Scope::new(1);
        scope.define_function("helper", 2);
        assert!(scope.declares("helper"));
        assert_eq!(scope.functions["helper"], 2);
    }
}
