use std::ops::Range;

/// Result of dispatching a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Ranges of the new text written by the transaction (empty for pure
    /// deletions)
    pub changed: Vec<Range<usize>>,
    pub new_selection: Range<usize>,
    pub version: u64,
}

impl Patch {
    /// Whether the transaction left the text untouched.
    pub fn is_selection_only(&self) -> bool {
        self.changed.is_empty()
    }
}
