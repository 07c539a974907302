//! The block list of the current text.

use blockpad_syntax::LanguageTable;
use log::debug;
use rowan::GreenNode;

use super::segment::{Segmenter, StringSegmenter, Strategy};
use super::{Block, BlockList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Tree,
    String,
}

/// Holds the most recently computed [`BlockList`] and the string segmenter
/// used whenever no up-to-date tree is available.
#[derive(Debug, Clone)]
pub struct BlockStore {
    list: BlockList,
    string: StringSegmenter,
    default_language: String,
    last_strategy: Option<StrategyKind>,
}

impl BlockStore {
    pub fn new(languages: &LanguageTable, default_language: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            list: BlockList::default(),
            string: StringSegmenter::new(languages)?,
            default_language: default_language.to_string(),
            last_strategy: None,
        })
    }

    /// Re-derive the block list from `text`, using `tree` if it describes
    /// that text.
    pub fn recompute(&mut self, text: &str, tree: Option<&GreenNode>) {
        let strategy = Strategy::select(tree, text.len(), &self.string);
        let kind = if strategy.is_tree() {
            StrategyKind::Tree
        } else {
            StrategyKind::String
        };
        if self.last_strategy.is_some_and(|last| last != kind) {
            debug!("block store switched to {kind:?} segmentation");
        }

        self.list = strategy.segment(text, &self.default_language);
        self.last_strategy = Some(kind);
    }

    pub fn list(&self) -> &BlockList {
        &self.list
    }

    pub fn blocks(&self) -> &[Block] {
        &self.list.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Segmenter used by the last [`BlockStore::recompute`].
    pub fn last_strategy(&self) -> Option<StrategyKind> {
        self.last_strategy
    }

    pub fn string_segmenter(&self) -> &StringSegmenter {
        &self.string
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }
}
