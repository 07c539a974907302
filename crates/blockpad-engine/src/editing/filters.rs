//! The ordered edit pipeline and the structural rules it enforces.
//!
//! Every transaction, whatever produced it, runs through [`PIPELINE`] in
//! order. The filters never fail: they clip, skip or drop.

use std::ops::Range;

use log::debug;

use super::changes::{Change, ChangeSet, Origin, Selection, Transaction};
use crate::blocks::BlockList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Clip changes that would touch protected delimiter text
    ProtectDelimiters,
    /// Stamp `created` on blocks receiving their first character
    RefreshTimestamps,
    /// Apply the steps, reparse, recompute the block list
    Apply,
    /// Keep the selection out of the first delimiter
    ClampSelection,
    /// Drop folds whose edge lines were edited, map the rest
    GuardFolds,
    /// Record history, bump the version
    Commit,
}

pub const PIPELINE: [Filter; 6] = [
    Filter::ProtectDelimiters,
    Filter::RefreshTimestamps,
    Filter::Apply,
    Filter::ClampSelection,
    Filter::GuardFolds,
    Filter::Commit,
];

/// Ranges an unflagged transaction may not modify.
///
/// Normally that is the first block's delimiter. A replace-all protects
/// every delimiter instead.
pub fn protected_ranges(origin: Origin, blocks: &BlockList) -> Vec<Range<usize>> {
    if origin.is_structural() || origin.is_history() {
        return Vec::new();
    }

    if origin == Origin::ReplaceAll {
        blocks
            .iter()
            .map(|block| block.delimiter.clone())
            .filter(|delimiter| !delimiter.is_empty())
            .collect()
    } else if blocks.first_delimiter_end > 0 {
        vec![0..blocks.first_delimiter_end]
    } else {
        Vec::new()
    }
}

/// Clip the first step of `tx` against the protected ranges of `blocks`.
///
/// Deleted bytes inside a protected range are kept. An insertion at a
/// position inside a protected range is dropped. A range's start is also the
/// end of the content in front of it, so an insertion there survives unless
/// the range starts the document. The text of a replacement that straddles a
/// protected range goes to the first surviving piece.
pub fn protect_delimiters(tx: &mut Transaction, blocks: &BlockList) {
    let protected = protected_ranges(tx.origin, blocks);
    if protected.is_empty() {
        return;
    }
    let Some(step) = tx.steps.first_mut() else {
        return;
    };

    let clipped: Vec<Change> = step
        .changes()
        .iter()
        .flat_map(|change| clip(change, &protected))
        .collect();

    if clipped.as_slice() != step.changes() {
        debug!(
            "clipped {:?} change(s) against protected ranges {protected:?}",
            tx.origin
        );
        let len = step.len_before();
        let clipped_step = ChangeSet::new(len, clipped);
        // An explicit selection was computed for the unclipped edit
        tx.selection = None;
        tx.steps[0] = clipped_step;
    }
}

fn clip(change: &Change, protected: &[Range<usize>]) -> Vec<Change> {
    if change.range.is_empty() {
        let at = change.range.start;
        if protected
            .iter()
            .any(|range| at < range.end && (range.start < at || range.start == 0))
        {
            return Vec::new();
        }
        return vec![change.clone()];
    }

    let mut pieces = vec![change.range.clone()];
    for range in protected {
        pieces = pieces
            .into_iter()
            .flat_map(|piece| subtract(piece, range))
            .collect();
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, range)| {
            let insert = if i == 0 {
                change.insert.clone()
            } else {
                String::new()
            };
            Change::new(range, insert)
        })
        .collect()
}

fn subtract(piece: Range<usize>, protected: &Range<usize>) -> Vec<Range<usize>> {
    if piece.end <= protected.start || piece.start >= protected.end {
        return vec![piece];
    }
    let mut rest = Vec::new();
    if piece.start < protected.start {
        rest.push(piece.start..protected.start);
    }
    if piece.end > protected.end {
        rest.push(protected.end..piece.end);
    }
    rest
}

/// Move anchor and head of an unflagged transaction's selection out of the
/// first delimiter.
pub fn clamp_selection(selection: Selection, origin: Origin, blocks: &BlockList) -> Selection {
    if origin.is_structural() {
        return selection;
    }
    let min = blocks.first_delimiter_end;
    Selection::new(selection.anchor.max(min), selection.head.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::Block;
    use pretty_assertions::assert_eq;

    // "\n∞∞∞text\nA\n∞∞∞text\nB"
    fn blocks() -> BlockList {
        let block = |delimiter: Range<usize>, content: Range<usize>| Block {
            language: "text".to_string(),
            auto: false,
            content,
            delimiter,
            created: None,
        };
        BlockList::new(vec![block(0..15, 15..16), block(16..31, 31..32)])
    }

    fn protect(origin: Origin, changes: Vec<Change>) -> Vec<Change> {
        let mut tx = Transaction::new(origin).with_changes(ChangeSet::new(32, changes));
        protect_delimiters(&mut tx, &blocks());
        tx.steps[0].changes().to_vec()
    }

    #[test]
    fn deletion_of_first_delimiter_is_dropped() {
        assert_eq!(protect(Origin::Input, vec![Change::delete(0..15)]), vec![]);
    }

    #[test]
    fn deletion_into_content_is_clipped() {
        assert_eq!(
            protect(Origin::Input, vec![Change::new(10..16, "x")]),
            vec![Change::new(15..16, "x")]
        );
    }

    #[test]
    fn insertion_inside_first_delimiter_is_dropped() {
        assert_eq!(protect(Origin::Input, vec![Change::insert(0, "x")]), vec![]);
        assert_eq!(protect(Origin::Input, vec![Change::insert(14, "x")]), vec![]);
        assert_eq!(
            protect(Origin::Input, vec![Change::insert(15, "x")]),
            vec![Change::insert(15, "x")]
        );
    }

    #[test]
    fn other_delimiters_are_editable_by_input() {
        assert_eq!(
            protect(Origin::Input, vec![Change::delete(16..31)]),
            vec![Change::delete(16..31)]
        );
    }

    #[test]
    fn replace_all_protects_every_delimiter() {
        assert_eq!(
            protect(
                Origin::ReplaceAll,
                vec![Change::new(4..8, "txt"), Change::new(20..24, "txt")]
            ),
            vec![]
        );
        assert_eq!(
            protect(Origin::ReplaceAll, vec![Change::new(15..32, "z")]),
            vec![Change::new(15..16, "z"), Change::delete(31..32)]
        );
    }

    #[test]
    fn replace_all_keeps_insertion_at_content_end() {
        // 16 is where the second delimiter starts and where "A" ends
        assert_eq!(
            protect(Origin::ReplaceAll, vec![Change::insert(16, "!")]),
            vec![Change::insert(16, "!")]
        );
        assert_eq!(
            protect(Origin::ReplaceAll, vec![Change::insert(0, "!")]),
            vec![]
        );
        assert_eq!(
            protect(Origin::ReplaceAll, vec![Change::insert(17, "!")]),
            vec![]
        );
    }

    #[test]
    fn structural_and_history_origins_are_not_clipped() {
        for origin in [Origin::AddBlock, Origin::ChangeLanguage, Origin::Undo, Origin::Redo] {
            assert_eq!(
                protect(origin, vec![Change::delete(0..15)]),
                vec![Change::delete(0..15)]
            );
        }
    }

    #[test]
    fn clamp_only_unflagged() {
        let selection = Selection::new(3, 20);
        assert_eq!(
            clamp_selection(selection, Origin::Input, &blocks()),
            Selection::new(15, 20)
        );
        assert_eq!(
            clamp_selection(selection, Origin::SelectDocument, &blocks()),
            selection
        );
    }

    #[test]
    fn pipeline_order() {
        assert_eq!(PIPELINE[0], Filter::ProtectDelimiters);
        assert_eq!(PIPELINE[1], Filter::RefreshTimestamps);
        assert_eq!(PIPELINE[2], Filter::Apply);
        assert_eq!(PIPELINE[5], Filter::Commit);
    }
}
