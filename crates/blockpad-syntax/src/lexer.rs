//! # Lexer - Tokenizing Block Documents
//!
//! This module provides the first stage of parsing: breaking source text into
//! tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token. Nothing is skipped,
//! which is what lets the tree reproduce the document byte for byte:
//!
//! ```
//! use blockpad_syntax::lexer::lex;
//!
//! let input = "\n∞∞∞json-a;created=2024-01-01T00:00:00.000Z\n{}\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tokens are context-free. The lexer does not know whether `∞∞∞` starts a
//! delimiter or sits in the middle of a JSON string; the grammar decides that
//! with the help of the language table. Only the characters that make up a
//! delimiter line get their own kinds:
//!
//! - `\n` → `NEWLINE`
//! - `∞∞∞` → `SENTINEL`
//! - `[A-Za-z0-9_]+` → `WORD` (language tokens, the `a` of `-a`, metadata keys)
//! - `-`, `;`, `=` → `DASH`, `SEMICOLON`, `EQ`
//!
//! Everything else becomes `TEXT`, grouped into runs.

use logos::Logos;

use crate::syntax_kind::SyntaxKind;

/// Token kinds produced by the Logos lexer.
///
/// This enum exists separately from [`SyntaxKind`] because Logos needs to
/// derive on it. Each variant maps to a corresponding `SyntaxKind` token.
///
/// [`SyntaxKind`]: crate::syntax_kind::SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Line feed. A preceding `\r` stays in the previous TEXT token.
    #[token("\n")]
    Newline,

    /// Delimiter sentinel
    #[token("∞∞∞")]
    Sentinel,

    #[regex(r"[A-Za-z0-9_]+")]
    Word,

    #[token("-")]
    Dash,

    #[token(";")]
    Semicolon,

    #[token("=")]
    Eq,

    /// One or two `∞` that do not make up a sentinel
    #[regex("∞∞?")]
    LooseInfinity,

    /// Plain text - anything not matched by other rules
    #[regex(r"[^\n;=A-Za-z0-9_∞-]+")]
    Text,
}

impl TokenKind {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TokenKind::Newline => SyntaxKind::NEWLINE,
            TokenKind::Sentinel => SyntaxKind::SENTINEL,
            TokenKind::Word => SyntaxKind::WORD,
            TokenKind::Dash => SyntaxKind::DASH,
            TokenKind::Semicolon => SyntaxKind::SEMICOLON,
            TokenKind::Eq => SyntaxKind::EQ,
            TokenKind::LooseInfinity | TokenKind::Text => SyntaxKind::TEXT,
        }
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        let kind = match result {
            Ok(token_kind) => token_kind.to_syntax_kind(),
            Err(()) => SyntaxKind::TEXT,
        };
        tokens.push((Token { kind, text }, span));
    }

    tokens
}
