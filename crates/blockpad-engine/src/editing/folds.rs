//! Folded ranges and the rule that keeps them safe across edits.
//!
//! A fold hides a byte range. Typing on the first or last line of a fold
//! would edit text the user cannot see, so such an edit unfolds it. Block
//! creation and undo/redo are exempt; they only move folds along.

use std::ops::Range;

use xi_rope::Rope;

use super::changes::{Assoc, Transaction};
use super::lines::{line_end, line_start};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folds {
    ranges: Vec<Range<usize>>,
}

impl Folds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fold. Empty and duplicate ranges are ignored.
    pub fn add(&mut self, range: Range<usize>) -> bool {
        if range.is_empty() || self.ranges.contains(&range) {
            return false;
        }
        let at = self
            .ranges
            .partition_point(|fold| (fold.start, fold.end) < (range.start, range.end));
        self.ranges.insert(at, range);
        true
    }

    /// Remove every fold overlapping `range` (or containing it, for an
    /// empty range). Returns how many were removed.
    pub fn remove_overlapping(&mut self, range: Range<usize>) -> usize {
        let before = self.ranges.len();
        self.ranges.retain(|fold| {
            if range.is_empty() {
                !(fold.start <= range.start && range.start <= fold.end)
            } else {
                fold.end <= range.start || fold.start >= range.end
            }
        });
        before - self.ranges.len()
    }

    pub fn contains(&self, range: &Range<usize>) -> bool {
        self.ranges.contains(range)
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Drop folds whose first or last line received an insertion, then map
    /// the remaining folds through the transaction. `text` is the document
    /// before `tx`.
    pub fn guard(&mut self, tx: &Transaction, text: &Rope) {
        if self.ranges.is_empty() || !tx.changes_content() {
            return;
        }

        if tx.origin.guards_folds()
            && let Some(step) = tx.steps.first()
        {
            let text = text.to_string();
            let inserted: Vec<&Range<usize>> = step
                .changes()
                .iter()
                .filter(|change| !change.insert.is_empty())
                .map(|change| &change.range)
                .collect();

            let before = self.ranges.len();
            self.ranges.retain(|fold| {
                let first = line_start(&text, fold.start)..line_end(&text, fold.start);
                let last = line_start(&text, fold.end)..line_end(&text, fold.end);
                !inserted
                    .iter()
                    .any(|range| touches(range, &first) || touches(range, &last))
            });
            if self.ranges.len() != before {
                log::debug!("unfolded {} fold(s) after edit", before - self.ranges.len());
            }
        }

        self.ranges = self
            .ranges
            .iter()
            .map(|fold| tx.map_pos(fold.start, Assoc::After)..tx.map_pos(fold.end, Assoc::Before))
            .filter(|fold| fold.start < fold.end)
            .collect();
    }
}

/// Whether a change over `range` lands on the line spanning `line` (newline
/// position included).
fn touches(range: &Range<usize>, line: &Range<usize>) -> bool {
    range.start <= line.end && range.end >= line.start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::changes::{Change, ChangeSet, Origin};
    use pretty_assertions::assert_eq;

    const TEXT: &str = "one\ntwo\nthree\nfour\n";

    fn tx(origin: Origin, change: Change) -> Transaction {
        Transaction::new(origin).with_changes(ChangeSet::new(TEXT.len(), vec![change]))
    }

    fn folded() -> Folds {
        let mut folds = Folds::new();
        // "two\nthree"
        folds.add(4..13);
        folds
    }

    #[test]
    fn add_ignores_empty_and_duplicates() {
        let mut folds = folded();
        assert!(!folds.add(4..13));
        assert!(!folds.add(3..3));
        assert!(folds.add(0..2));
        assert_eq!(folds.ranges(), &[0..2, 4..13]);
    }

    #[test]
    fn insertion_on_first_line_unfolds() {
        let mut folds = folded();
        folds.guard(&tx(Origin::Input, Change::insert(5, "x")), &Rope::from(TEXT));
        assert!(folds.is_empty());
    }

    #[test]
    fn insertion_on_last_line_unfolds() {
        let mut folds = folded();
        folds.guard(&tx(Origin::Input, Change::insert(10, "x")), &Rope::from(TEXT));
        assert!(folds.is_empty());
    }

    #[test]
    fn block_creation_keeps_fold() {
        let mut folds = folded();
        folds.guard(&tx(Origin::AddBlock, Change::insert(5, "x")), &Rope::from(TEXT));
        assert_eq!(folds.ranges(), &[4..14]);
    }

    #[test]
    fn edits_elsewhere_shift_fold() {
        let mut folds = folded();
        folds.guard(&tx(Origin::Input, Change::insert(0, "zero ")), &Rope::from(TEXT));
        assert_eq!(folds.ranges(), &[9..18]);

        folds.guard(
            &Transaction::new(Origin::Input)
                .with_changes(ChangeSet::new(24, vec![Change::delete(19..24)])),
            &Rope::from("zero one\ntwo\nthree\nfour\n"),
        );
        assert_eq!(folds.ranges(), &[9..18]);
    }

    #[test]
    fn deletion_collapsing_fold_drops_it() {
        let mut folds = folded();
        folds.guard(&tx(Origin::Undo, Change::delete(3..14)), &Rope::from(TEXT));
        assert!(folds.is_empty());
    }

    #[test]
    fn remove_overlapping_by_position() {
        let mut folds = folded();
        folds.add(14..18);
        assert_eq!(folds.remove_overlapping(13..13), 1);
        assert_eq!(folds.ranges(), &[14..18]);
    }
}
