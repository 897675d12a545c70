//! Label and goto bookkeeping.
//!
//! `::name::` is emitted as a do-nothing `def goto_name(): pass` marker and
//! `goto name` as a call to it (see the `goto`/`label` rewrite rules). Nothing
//! is reordered, so this only approximates a jump when the label is already
//! the next code to run. What remains here is matching gotos to labels.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::rewrite::GotoTarget;
use std::collections::BTreeMap;

/// Gotos whose label never appears anywhere in the input.
pub fn unresolved<'a>(
    labels: &BTreeMap<String, usize>,
    gotos: &'a [GotoTarget],
) -> impl Iterator<Item = &'a GotoTarget> {
    gotos
        .iter()
        .filter(move |goto| !labels.contains_key(&goto.label))
}

/// Shift recorded label positions at or after `index` by `count` lines.
pub fn shift_labels(labels: &mut BTreeMap<String, usize>, index: usize, count: usize) {
    for position in labels.values_mut() {
        if *position >= index {
            *position += count;
        }
    }
}

/// One diagnostic per unresolved goto.
pub fn report(
    labels: &BTreeMap<String, usize>,
    gotos: &[GotoTarget],
    diagnostics: &mut Diagnostics,
) {
    for goto in unresolved(labels, gotos) {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::UnresolvedGoto,
                format!("goto `{}` has no matching label", goto.label),
            )
            .at(goto.line),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(line: usize, label: &str) -> GotoTarget {
        GotoTarget {
            line,
            label: label.to_string(),
        }
    }

    #[test]
    fn labels_resolve_by_name_only() {
        let labels = BTreeMap::from([("done".to_string(), 7)]);
        let gotos = vec![target(2, "done"), target(3, "retry")];
        let missing: Vec<_> = unresolved(&labels, &gotos).collect();
        assert_eq!(missing, vec![&gotos[1]]);

        let mut diagnostics = Diagnostics::default();
        report(&labels, &gotos, &mut diagnostics);
        assert_eq!(diagnostics.count(DiagnosticKind::UnresolvedGoto), 1);
    }

    #[test]
    fn shifting_moves_later_labels() {
        let mut labels = BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 5)]);
        shift_labels(&mut labels, 3, 2);
        assert_eq!(labels["a"], 1);
        assert_eq!(labels["b"], 7);
    }
}
