//! # blockpad-syntax
//!
//! A lossless syntax tree for block documents using [Rowan] + [Logos],
//! following the [rust-analyzer] architecture model.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## What is a block document?
//!
//! One text buffer holding many independently language-tagged blocks. Each
//! block starts with a delimiter line:
//!
//! ```text
//! \n∞∞∞<language>(-a)?(;key=value)*\n
//! ```
//!
//! `-a` marks a language picked by auto-detection, and `created=<timestamp>`
//! is the metadata entry the editor core cares about. Text before the first
//! delimiter forms an implicit leading block.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree
//!               (Logos)          (Grammar +          (GreenNodeBuilder)
//!                                 LanguageTable)
//! ```
//!
//! The grammar is language-aware in two ways: a delimiter only counts when
//! its language token is registered, and a block whose language has a
//! [`NestedParser`] can shield delimiter-shaped lines inside its own
//! constructs (a block comment spanning lines, for example). A plain regex scan
//! of the text cannot do the latter.
//!
//! ## Module Structure
//!
//! ```text
//! blockpad-syntax/
//! ├── lib.rs           # This file - public API and integration tests
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! ├── language.rs      # LanguageTable, NestedParser, built-in nested parsers
//! ├── lexer.rs         # Logos-based tokenizer
//! └── parser/
//!     ├── mod.rs       # Parser struct, Marker system, public parse() function
//!     ├── event.rs     # Event enum (Start, Token, Finish, Placeholder)
//!     ├── sink.rs      # Converts events to Rowan GreenNode
//!     └── grammar/
//!         ├── mod.rs       # Root document parsing
//!         ├── delimiter.rs # Delimiter lines
//!         └── note.rs      # Blocks and block bodies
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use blockpad_syntax::{LanguageTable, SyntaxKind, parse};
//!
//! let languages = LanguageTable::from_tokens(["text", "json"]).unwrap();
//! let tree = parse("\n∞∞∞text\nhello\n∞∞∞json-a\n{}", &languages);
//!
//! // The tree preserves all text
//! assert_eq!(tree.text().to_string(), "\n∞∞∞text\nhello\n∞∞∞json-a\n{}");
//!
//! // One NOTE per block
//! assert_eq!(tree.kind(), SyntaxKind::ROOT);
//! assert_eq!(tree.children().count(), 2);
//! ```

pub mod language;
pub mod lexer;
pub mod parser;
pub mod syntax_kind;

pub use language::{
    LanguageError, LanguageTable, NestedParser, StringLiteralParser, builtin_nested_parser,
    is_valid_token,
};
pub use parser::parse;
pub use syntax_kind::{BlockLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// The three-character sentinel that opens every delimiter line.
pub const SENTINEL: &str = "∞∞∞";
