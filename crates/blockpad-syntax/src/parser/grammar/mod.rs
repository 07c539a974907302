//! # Grammar Rules
//!
//! This module contains the grammar rules that drive parsing. Each function
//! takes a `&mut Parser` and uses its methods to:
//!
//! 1. Inspect the current token (`p.current()`, `p.at()`, `p.nth()`)
//! 2. Consume tokens (`p.bump()`, `p.eat()`)
//! 3. Build tree structure (`p.start()` → marker → `complete()`/`abandon()`)
//!
//! ## Shape of the tree
//!
//! ```text
//! ROOT
//!   NOTE                      (implicit leading block, only if the text
//!     NOTE_CONTENT             does not start with a delimiter)
//!   NOTE
//!     DELIMITER
//!       NEWLINE SENTINEL
//!       LANGUAGE { WORD }
//!       AUTO_FLAG { DASH WORD }?
//!       METADATA { SEMICOLON METADATA_KEY EQ METADATA_VALUE }*
//!       NEWLINE
//!     NOTE_CONTENT
//! ```
//!
//! ## Module Structure
//!
//! - [`delimiter`] - Delimiter recognition (lookahead) and delimiter nodes
//! - [`note`] - Blocks and block bodies
//!
//! ## Error Recovery
//!
//! There are no syntax errors in a block document: a line that is not a valid
//! delimiter is simply content. Every input produces a tree that preserves
//! all bytes.

mod delimiter;
mod note;

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse the root document.
///
/// This is the entry point for parsing. It creates a ROOT node containing
/// one NOTE per block.
pub fn root(p: &mut Parser<'_, '_>) {
    let m = p.start();

    if delimiter::delimiter_len(p, 0).is_none() {
        note::leading_note(p);
    }

    while !p.at_end() {
        note::note(p);
    }

    m.complete(p, SyntaxKind::ROOT);
}
