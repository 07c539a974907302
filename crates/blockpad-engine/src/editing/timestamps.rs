//! `created` bookkeeping.
//!
//! A block is stamped when it receives its first character: a pure insertion
//! at the content start of a block that was empty before the edit. The new
//! stamp is written by a follow-up step in the same transaction, so undo
//! restores the previous stamp and redo brings the new one back.

use std::collections::BTreeSet;

use blockpad_syntax::LanguageTable;
use chrono::{DateTime, Utc};
use log::debug;
use xi_rope::Rope;

use super::changes::{Assoc, Change, ChangeSet, Transaction};
use crate::blocks::{BlockList, Delimiter};

/// Append a delimiter rewrite to `tx` for the block its first step fills.
///
/// `text` and `blocks` describe the document before `tx`. Nothing happens
/// when the first step touches more than one block.
pub fn refresh_timestamps(
    tx: &mut Transaction,
    text: &Rope,
    blocks: &BlockList,
    languages: &LanguageTable,
    now: DateTime<Utc>,
) {
    if !tx.origin.refreshes_timestamps() {
        return;
    }
    let Some(step) = tx.steps.first() else {
        return;
    };
    if step.is_empty() {
        return;
    }

    let touched: BTreeSet<usize> = step
        .changes()
        .iter()
        .flat_map(|change| {
            blocks.index_at(change.range.start)..=blocks.index_at(change.range.end)
        })
        .collect();
    if touched.len() != 1 {
        return;
    }

    let Some(block) = touched
        .iter()
        .filter_map(|&index| blocks.get(index))
        .find(|block| {
            !block.is_implicit()
                && block.content.is_empty()
                && step.changes().iter().any(|change| {
                    change.is_pure_insertion() && change.range.start == block.content.start
                })
        })
    else {
        return;
    };

    let after = step.apply(text);
    let start = step.map_pos(block.delimiter.start, Assoc::After);
    let end = step.map_pos(block.delimiter.end, Assoc::Before);
    let current = after.slice_to_cow(start..end);
    let Some(delimiter) = Delimiter::parse(&current, languages) else {
        debug!("skipping timestamp refresh: delimiter at {start}..{end} no longer parses");
        return;
    };

    let stamped = delimiter.with_created(now).to_text();
    if stamped == current {
        return;
    }

    let follow_up = ChangeSet::new(after.len(), vec![Change::new(start..end, stamped)]);
    tx.push_step(follow_up);
}
