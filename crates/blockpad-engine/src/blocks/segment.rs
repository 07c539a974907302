//! Turning document text into a [`BlockList`].
//!
//! Two segmenters produce the same list for the same text:
//!
//! - [`TreeSegmenter`] walks the lossless syntax tree. The grammar behind it
//!   asks the block language's nested parser which parts of the body belong
//!   to the nested language, so a delimiter-shaped line inside a construct
//!   that spans lines (a host-supplied block comment parser, say) stays
//!   content.
//! - [`StringSegmenter`] is a regex scan over the raw text. It is always
//!   available but knows nothing about nested languages: the same
//!   delimiter-shaped line splits the block there.
//!
//! Outside that nested-content case the two agree byte for byte. The
//! [`Strategy`] picks the tree whenever it describes the current text.

use blockpad_syntax::{LanguageTable, SyntaxKind, SyntaxNode};
use regex::Regex;
use rowan::GreenNode;

use super::delimiter::Delimiter;
use super::{Block, BlockList};

pub trait Segmenter {
    /// Segment `text`. Text before the first delimiter becomes an implicit
    /// block tagged `default_language`.
    fn segment(&self, text: &str, default_language: &str) -> BlockList;
}

/// Reads blocks off a parsed syntax tree.
#[derive(Debug, Clone)]
pub struct TreeSegmenter {
    root: SyntaxNode,
}

impl TreeSegmenter {
    pub fn new(tree: &GreenNode) -> Self {
        Self {
            root: SyntaxNode::new_root(tree.clone()),
        }
    }
}

impl Segmenter for TreeSegmenter {
    fn segment(&self, text: &str, default_language: &str) -> BlockList {
        debug_assert_eq!(usize::from(self.root.text_range().len()), text.len());

        let blocks = self
            .root
            .children()
            .filter(|node| node.kind() == SyntaxKind::NOTE)
            .map(|note| note_to_block(&note, default_language))
            .collect();
        BlockList::new(blocks)
    }
}

fn note_to_block(note: &SyntaxNode, default_language: &str) -> Block {
    let note_range = node_range(note);
    let content = note
        .children()
        .find(|node| node.kind() == SyntaxKind::NOTE_CONTENT)
        .map(|node| node_range(&node))
        .unwrap_or(note_range.end..note_range.end);

    let Some(delimiter) = note
        .children()
        .find(|node| node.kind() == SyntaxKind::DELIMITER)
    else {
        return Block::implicit(default_language, content);
    };

    let language = child_text(&delimiter, SyntaxKind::LANGUAGE).unwrap_or_default();
    let auto = delimiter
        .children()
        .any(|node| node.kind() == SyntaxKind::AUTO_FLAG);
    let entries = delimiter
        .children()
        .filter(|node| node.kind() == SyntaxKind::METADATA)
        .map(|entry| {
            (
                child_text(&entry, SyntaxKind::METADATA_KEY).unwrap_or_default(),
                child_text(&entry, SyntaxKind::METADATA_VALUE).unwrap_or_default(),
            )
        });
    let parsed = Delimiter::from_entries(language, auto, entries);

    Block {
        language: parsed.language,
        auto: parsed.auto,
        content,
        delimiter: node_range(&delimiter),
        created: parsed.created,
    }
}

fn node_range(node: &SyntaxNode) -> std::ops::Range<usize> {
    let range = node.text_range();
    range.start().into()..range.end().into()
}

fn child_text(node: &SyntaxNode, kind: SyntaxKind) -> Option<String> {
    node.children()
        .find(|child| child.kind() == kind)
        .map(|child| child.text().to_string())
}

/// Regex scan for delimiter lines.
#[derive(Debug, Clone)]
pub struct StringSegmenter {
    /// `None` when no language is registered: nothing can be a delimiter
    pattern: Option<Regex>,
    languages: LanguageTable,
}

impl StringSegmenter {
    pub fn new(languages: &LanguageTable) -> Result<Self, regex::Error> {
        let mut tokens: Vec<&str> = languages.tokens().collect();
        // Longest first so `java` never shadows `javascript`
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

        let pattern = if tokens.is_empty() {
            None
        } else {
            let alternation = tokens
                .iter()
                .map(|token| regex::escape(token))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(
                r"\n∞∞∞(?:{alternation})(?:-a)?(?:;[A-Za-z0-9_-]+=[^;\n]*)*\n"
            ))?)
        };

        Ok(Self {
            pattern,
            languages: languages.clone(),
        })
    }
}

impl Segmenter for StringSegmenter {
    fn segment(&self, text: &str, default_language: &str) -> BlockList {
        let delimiters: Vec<(std::ops::Range<usize>, Delimiter)> = self
            .pattern
            .iter()
            .flat_map(|pattern| pattern.find_iter(text))
            .filter_map(|found| {
                Delimiter::parse(found.as_str(), &self.languages).map(|d| (found.range(), d))
            })
            .collect();

        let mut blocks = Vec::with_capacity(delimiters.len() + 1);
        let first_start = delimiters.first().map_or(text.len(), |(range, _)| range.start);
        if first_start > 0 || delimiters.is_empty() {
            blocks.push(Block::implicit(default_language, 0..first_start));
        }

        for (i, (range, delimiter)) in delimiters.iter().enumerate() {
            let content_end = delimiters
                .get(i + 1)
                .map_or(text.len(), |(next, _)| next.start);
            blocks.push(Block {
                language: delimiter.language.clone(),
                auto: delimiter.auto,
                content: range.end..content_end,
                delimiter: range.clone(),
                created: delimiter.created,
            });
        }

        BlockList::new(blocks)
    }
}

/// Which segmenter produces the block list for the current text.
#[derive(Debug, Clone)]
pub enum Strategy<'a> {
    Tree(TreeSegmenter),
    String(&'a StringSegmenter),
}

impl<'a> Strategy<'a> {
    /// The tree when one exists and covers exactly `doc_len` bytes, the
    /// string scan otherwise.
    pub fn select(tree: Option<&GreenNode>, doc_len: usize, fallback: &'a StringSegmenter) -> Self {
        match tree {
            Some(tree) if usize::from(tree.text_len()) == doc_len => {
                Strategy::Tree(TreeSegmenter::new(tree))
            }
            _ => Strategy::String(fallback),
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Strategy::Tree(_))
    }
}

impl Segmenter for Strategy<'_> {
    fn segment(&self, text: &str, default_language: &str) -> BlockList {
        match self {
            Strategy::Tree(tree) => tree.segment(text, default_language),
            Strategy::String(string) => string.segment(text, default_language),
        }
    }
}
