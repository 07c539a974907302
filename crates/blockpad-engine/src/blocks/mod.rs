//! # Block Model
//!
//! A document is one buffer holding an ordered run of blocks. Each block is a
//! delimiter line followed by content; the block list is derived from the text
//! on every edit and never stored separately:
//!
//! ```text
//! \n∞∞∞text\nA\n∞∞∞json-a;created=…\n{}
//! └delimiter┘│└──────delimiter─────┘└┘
//!            content                content
//! ```
//!
//! - **`delimiter`**: Delimiter grammar, canonical serializer, timestamps
//! - **`segment`**: The two segmenters (syntax tree walk, regex scan) and the
//!   `Strategy` that picks between them
//! - **`store`**: The current block list, recomputed after content changes

pub mod delimiter;
pub mod segment;
pub mod store;

use std::ops::Range;

use chrono::{DateTime, Utc};

pub use delimiter::Delimiter;
pub use segment::{Segmenter, StringSegmenter, Strategy, TreeSegmenter};
pub use store::BlockStore;

/// One language-tagged block of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub language: String,
    /// Language was picked by auto-detection (`-a`)
    pub auto: bool,
    /// Byte range of the block body
    pub content: Range<usize>,
    /// Byte range of the delimiter, both newlines included. Empty for an
    /// implicit leading block.
    pub delimiter: Range<usize>,
    pub created: Option<DateTime<Utc>>,
}

impl Block {
    pub fn implicit(default_language: &str, content: Range<usize>) -> Self {
        Self {
            language: default_language.to_string(),
            auto: false,
            delimiter: content.start..content.start,
            content,
            created: None,
        }
    }

    /// Block without a delimiter of its own (text before the first delimiter).
    pub fn is_implicit(&self) -> bool {
        self.delimiter.is_empty()
    }

    /// Delimiter plus content.
    pub fn range(&self) -> Range<usize> {
        self.delimiter.start..self.content.end
    }
}

/// Ordered blocks covering the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockList {
    pub blocks: Vec<Block>,
    /// End of the first block's delimiter; `0` when the first block is
    /// implicit.
    pub first_delimiter_end: usize,
}

impl BlockList {
    pub fn new(blocks: Vec<Block>) -> Self {
        let first_delimiter_end = blocks.first().map_or(0, |block| block.delimiter.end);
        Self {
            blocks,
            first_delimiter_end,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Index of the block a position belongs to.
    ///
    /// A position on the boundary between two blocks (end of one content,
    /// start of the next delimiter) belongs to the earlier block; a position
    /// inside a delimiter belongs to the block that delimiter opens.
    pub fn index_at(&self, pos: usize) -> usize {
        self.blocks
            .iter()
            .position(|block| pos <= block.content.end)
            .unwrap_or_else(|| self.blocks.len().saturating_sub(1))
    }

    pub fn block_at(&self, pos: usize) -> Option<&Block> {
        self.blocks.get(self.index_at(pos))
    }

    /// Delimiter that strictly contains `pos`, if any.
    pub fn delimiter_around(&self, pos: usize) -> Option<Range<usize>> {
        self.blocks
            .iter()
            .map(|block| block.delimiter.clone())
            .find(|delimiter| delimiter.start < pos && pos < delimiter.end)
    }

    /// Check the structural invariants of a list derived from a document of
    /// `len` bytes.
    pub fn is_well_formed(&self, len: usize) -> bool {
        let Some(first) = self.blocks.first() else {
            return false;
        };
        let Some(last) = self.blocks.last() else {
            return false;
        };
        first.delimiter.start == 0
            && last.content.end == len
            && self.first_delimiter_end == first.delimiter.end
            && self
                .blocks
                .iter()
                .all(|block| block.delimiter.end == block.content.start)
            && self
                .blocks
                .windows(2)
                .all(|pair| pair[1].delimiter.start == pair[0].content.end)
            && self.blocks.iter().skip(1).all(|block| !block.is_implicit())
    }
}

impl<'a> IntoIterator for &'a BlockList {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
