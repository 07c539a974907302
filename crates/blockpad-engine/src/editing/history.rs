//! Undo/redo stacks.
//!
//! Every committed content change is stored as a [`Revision`]: the steps that
//! were applied, their inverses, and the selection on either side. Undo and
//! redo replay those through the normal edit pipeline, so the buffer, block
//! list and folds stay in step with the history.

use super::changes::{ChangeSet, Origin, Selection, Transaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub steps: Vec<ChangeSet>,
    /// Inverse of each step, in the same order as `steps`
    pub inverses: Vec<ChangeSet>,
    pub selection_before: Selection,
    pub selection_after: Selection,
    pub origin: Origin,
}

impl Revision {
    pub fn undo_transaction(&self) -> Transaction {
        Transaction {
            steps: self.inverses.iter().rev().cloned().collect(),
            selection: Some(self.selection_before),
            origin: Origin::Undo,
        }
    }

    pub fn redo_transaction(&self) -> Transaction {
        Transaction {
            steps: self.steps.clone(),
            selection: Some(self.selection_after),
            origin: Origin::Redo,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct History {
    undo: Vec<Revision>,
    redo: Vec<Revision>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new revision. Anything that could be redone is discarded.
    pub fn record(&mut self, revision: Revision) {
        self.undo.push(revision);
        self.redo.clear();
    }

    pub fn pop_undo(&mut self) -> Option<Revision> {
        self.undo.pop()
    }

    pub fn pop_redo(&mut self) -> Option<Revision> {
        self.redo.pop()
    }

    /// Put an undone revision on the redo stack.
    pub fn push_redo(&mut self, revision: Revision) {
        self.redo.push(revision);
    }

    /// Put a redone revision back on the undo stack, keeping the rest of the
    /// redo stack.
    pub fn push_undo(&mut self, revision: Revision) {
        self.undo.push(revision);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::changes::Change;
    use pretty_assertions::assert_eq;
    use xi_rope::Rope;

    fn revision(text: &str, at: usize, insert: &str) -> Revision {
        let step = ChangeSet::new(text.len(), vec![Change::insert(at, insert)]);
        let inverse = step.invert(&Rope::from(text));
        Revision {
            steps: vec![step],
            inverses: vec![inverse],
            selection_before: Selection::caret(at),
            selection_after: Selection::caret(at + insert.len()),
            origin: Origin::Input,
        }
    }

    #[test]
    fn undo_transaction_reverts() {
        let rev = revision("abc", 1, "XY");
        let after = rev.steps[0].apply(&Rope::from("abc"));
        assert_eq!(after.to_string(), "aXYbc");

        let undo = rev.undo_transaction();
        assert_eq!(undo.origin, Origin::Undo);
        assert_eq!(undo.selection, Some(Selection::caret(1)));
        let restored = undo
            .steps
            .iter()
            .fold(after, |text, step| step.apply(&text));
        assert_eq!(restored.to_string(), "abc");

        let redo = rev.redo_transaction();
        assert_eq!(redo.origin, Origin::Redo);
        assert_eq!(redo.selection, Some(Selection::caret(3)));
    }

    #[test]
    fn record_clears_redo() {
        let mut history = History::new();
        history.record(revision("abc", 0, "x"));
        let undone = history.pop_undo().unwrap();
        history.push_redo(undone);
        assert!(history.can_redo());
        assert!(!history.can_undo());

        history.record(revision("abc", 1, "y"));
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn redo_keeps_remaining_redo_entries() {
        let mut history = History::new();
        history.record(revision("abc", 0, "x"));
        history.record(revision("xabc", 0, "y"));
        let second = history.pop_undo().unwrap();
        history.push_redo(second);
        let first = history.pop_undo().unwrap();
        history.push_redo(first);

        let redone = history.pop_redo().unwrap();
        assert_eq!(redone.steps[0].changes()[0].insert, "x");
        history.push_undo(redone);
        assert!(history.can_redo());
    }
}
