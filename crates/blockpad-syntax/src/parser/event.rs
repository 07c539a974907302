//! Flat parse events, turned into a tree by [`Sink`](super::sink::Sink).
//!
//! `Parser::bump` consumes exactly one lexer token per [`Event::Token`], so a
//! token event carries nothing: the sink reads kind and text off the token
//! stream in order.

use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Open a node. `forward_parent` is the index of the `Start` of a node
    /// that wraps this one (set by `CompletedMarker::precede`: a `NOTE`
    /// around its already parsed `DELIMITER`).
    Start {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },
    /// The next lexer token
    Token,
    Finish,
    /// Slot of a marker that is still open or was abandoned
    Placeholder,
}
