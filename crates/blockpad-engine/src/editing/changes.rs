//! Change sets, selections and transactions.
//!
//! A [`ChangeSet`] is a list of sorted, non-overlapping replacements against
//! one version of the text. A [`Transaction`] is an ordered list of change
//! sets (each against the text the previous one produced) plus an optional
//! explicit selection and the [`Origin`] that decides which structural rules
//! apply to it.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

/// One replacement: `range` of the old text becomes `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub range: Range<usize>,
    pub insert: String,
}

impl Change {
    pub fn new(range: Range<usize>, insert: impl Into<String>) -> Self {
        Self {
            range,
            insert: insert.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at..at, text)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::new(range, String::new())
    }

    pub fn is_noop(&self) -> bool {
        self.range.is_empty() && self.insert.is_empty()
    }

    /// Empty replaced range with text to insert.
    pub fn is_pure_insertion(&self) -> bool {
        self.range.is_empty() && !self.insert.is_empty()
    }
}

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    changes: Vec<Change>,
    /// Length of the text this set applies to
    len: usize,
}

impl ChangeSet {
    /// Build a change set against a text of `len` bytes.
    ///
    /// Changes are sorted by position and clamped to `len`. Two changes
    /// starting at the same offset are merged; a change overlapping an
    /// earlier one is ignored.
    pub fn new(len: usize, changes: impl IntoIterator<Item = Change>) -> Self {
        let mut sorted: Vec<Change> = changes
            .into_iter()
            .map(|mut change| {
                let end = change.range.end.min(len);
                let start = change.range.start.min(end);
                change.range = start..end;
                change
            })
            .filter(|change| !change.is_noop())
            .collect();
        sorted.sort_by_key(|change| (change.range.start, change.range.end));

        let mut merged: Vec<Change> = Vec::with_capacity(sorted.len());
        for change in sorted {
            match merged.last_mut() {
                Some(last) if last.range.start == change.range.start => {
                    last.range.end = last.range.end.max(change.range.end);
                    last.insert.push_str(&change.insert);
                }
                Some(last) if change.range.start < last.range.end => {
                    log::debug!("ignoring overlapping change at {:?}", change.range);
                }
                _ => merged.push(change),
            }
        }

        Self {
            changes: merged,
            len,
        }
    }

    pub fn empty(len: usize) -> Self {
        Self {
            changes: Vec::new(),
            len,
        }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Length of the text before the changes.
    pub fn len_before(&self) -> usize {
        self.len
    }

    pub fn len_after(&self) -> usize {
        self.changes.iter().fold(self.len, |len, change| {
            len - change.range.len() + change.insert.len()
        })
    }

    pub fn to_delta(&self) -> Delta<RopeInfo> {
        let mut builder = Builder::new(self.len);
        for change in &self.changes {
            if change.insert.is_empty() {
                builder.delete(change.range.clone());
            } else {
                builder.replace(change.range.clone(), Rope::from(change.insert.as_str()));
            }
        }
        builder.build()
    }

    pub fn apply(&self, text: &Rope) -> Rope {
        if self.changes.is_empty() {
            return text.clone();
        }
        self.to_delta().apply(text)
    }

    /// A change set that reverts this one. `original` is the text this set
    /// applies to.
    pub fn invert(&self, original: &Rope) -> ChangeSet {
        let mut shift: isize = 0;
        let inverted = self.changes.iter().map(|change| {
            let start = offset(change.range.start, shift);
            shift += change.insert.len() as isize - change.range.len() as isize;
            Change::new(
                start..start + change.insert.len(),
                original.slice_to_cow(change.range.clone()).into_owned(),
            )
        });
        ChangeSet::new(self.len_after(), inverted.collect::<Vec<_>>())
    }

    /// Map a position in the old text to the new text.
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        let mut shift: isize = 0;
        for change in &self.changes {
            let Range { start, end } = change.range;
            if pos < start {
                break;
            }
            let inside = if start == end { pos == start } else { pos < end };
            if inside {
                let new_start = offset(start, shift);
                return match assoc {
                    Assoc::Before => new_start,
                    Assoc::After => new_start + change.insert.len(),
                };
            }
            shift += change.insert.len() as isize - change.range.len() as isize;
        }
        offset(pos, shift)
    }

    /// Ranges in the new text covered by each change (empty for deletions).
    pub fn changed_ranges(&self) -> Vec<Range<usize>> {
        let mut shift: isize = 0;
        self.changes
            .iter()
            .map(|change| {
                let start = offset(change.range.start, shift);
                shift += change.insert.len() as isize - change.range.len() as isize;
                start..start + change.insert.len()
            })
            .collect()
    }

    /// New-text ranges of changes that inserted something.
    pub fn inserted_ranges(&self) -> Vec<Range<usize>> {
        self.changed_ranges()
            .into_iter()
            .filter(|range| !range.is_empty())
            .collect()
    }
}

fn offset(pos: usize, shift: isize) -> usize {
    pos.saturating_add_signed(shift)
}

/// Anchor and head of the selection; equal for a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn caret(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn range(&self) -> Range<usize> {
        self.from()..self.to()
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    pub fn map(&self, changes: &ChangeSet) -> Self {
        Self::new(
            changes.map_pos(self.anchor, Assoc::After),
            changes.map_pos(self.head, Assoc::After),
        )
    }

    pub fn clamp(&self, len: usize) -> Self {
        Self::new(self.anchor.min(len), self.head.min(len))
    }
}

/// Where a transaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Input,
    Undo,
    Redo,
    ContentLoad,
    AddBlock,
    MoveLines,
    DeleteLine,
    ChangeLanguage,
    LanguageDetection,
    ReplaceAll,
    SelectDocument,
}

impl Origin {
    /// Structural transactions may touch delimiters and the area before the
    /// first block's content; their selection is not clamped.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Origin::ContentLoad
                | Origin::AddBlock
                | Origin::MoveLines
                | Origin::ChangeLanguage
                | Origin::LanguageDetection
                | Origin::SelectDocument
        )
    }

    pub fn is_history(self) -> bool {
        matches!(self, Origin::Undo | Origin::Redo)
    }

    pub fn refreshes_timestamps(self) -> bool {
        !matches!(
            self,
            Origin::Undo | Origin::Redo | Origin::ContentLoad | Origin::AddBlock
        )
    }

    pub fn guards_folds(self) -> bool {
        !matches!(self, Origin::Undo | Origin::Redo | Origin::AddBlock)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub steps: Vec<ChangeSet>,
    /// Selection after all steps; `None` maps the current selection through
    /// the steps.
    pub selection: Option<Selection>,
    pub origin: Origin,
}

impl Transaction {
    pub fn new(origin: Origin) -> Self {
        Self {
            steps: Vec::new(),
            selection: None,
            origin,
        }
    }

    pub fn with_changes(mut self, changes: ChangeSet) -> Self {
        self.push_step(changes);
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Append a step. An explicit selection is mapped through it.
    pub fn push_step(&mut self, changes: ChangeSet) {
        if let Some(selection) = self.selection.as_mut() {
            *selection = selection.map(&changes);
        }
        self.steps.push(changes);
    }

    pub fn changes_content(&self) -> bool {
        self.steps.iter().any(|step| !step.is_empty())
    }

    /// Map a position before the transaction to the text after it.
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        self.steps
            .iter()
            .fold(pos, |pos, step| step.map_pos(pos, assoc))
    }
}
