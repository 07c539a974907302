//! Registered language tokens and the nested-parser lookup table.
//!
//! The block grammar only needs two things from a block's language: whether
//! the token is registered at all (unregistered tokens never form a
//! delimiter) and, optionally, a [`NestedParser`] that knows which parts of
//! the block body belong to the nested language's own constructs.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LanguageError {
    #[error("invalid language token {token:?}: tokens must match [A-Za-z0-9_]+")]
    InvalidToken { token: String },
}

/// A nested-language parser as seen by the block grammar.
///
/// `protected_spans` receives the text from the start of a block's content to
/// the end of the document and returns byte ranges (relative to that text)
/// that belong to a nested construct. A delimiter-shaped line whose leading
/// newline falls inside one of these ranges does not end the block.
///
/// Only a construct that can legally span lines should report a span across
/// a newline. The grammar cannot tell such a span from an opening token that
/// pairs with a closing one in a later block.
pub trait NestedParser: Send + Sync + fmt::Debug {
    fn protected_spans(&self, text: &str) -> Vec<Range<usize>>;
}

/// Double-quoted string literals with backslash escapes, as in JSON.
///
/// Only closed strings are reported. A JSON string cannot hold a raw newline,
/// so a quote still open at the end of its line protects nothing and can
/// never pair with a quote in a later block.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringLiteralParser;

impl NestedParser for StringLiteralParser {
    fn protected_spans(&self, text: &str) -> Vec<Range<usize>> {
        let bytes = text.as_bytes();
        let mut spans = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'"' {
                i += 1;
                continue;
            }

            let start = i;
            i += 1;
            let mut closed = false;
            while i < bytes.len() {
                match bytes[i] {
                    b'\n' => break,
                    b'\\' if bytes.get(i + 1) == Some(&b'\n') => break,
                    b'\\' => i += 2,
                    b'"' => {
                        i += 1;
                        closed = true;
                        break;
                    }
                    _ => i += 1,
                }
            }

            if closed {
                spans.push(start..i);
            }
        }

        spans
    }
}

/// Table of registered language tokens, each with an optional nested parser.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    entries: BTreeMap<String, Option<Arc<dyn NestedParser>>>,
}

impl LanguageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from plain tokens, attaching the built-in nested parsers
    /// (see [`builtin_nested_parser`]).
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, LanguageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for token in tokens {
            let token = token.as_ref();
            table.register(token, builtin_nested_parser(token))?;
        }
        Ok(table)
    }

    pub fn register(
        &mut self,
        token: &str,
        nested: Option<Arc<dyn NestedParser>>,
    ) -> Result<(), LanguageError> {
        if !is_valid_token(token) {
            return Err(LanguageError::InvalidToken {
                token: token.to_string(),
            });
        }
        self.entries.insert(token.to_string(), nested);
        Ok(())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn nested(&self, token: &str) -> Option<&dyn NestedParser> {
        self.entries.get(token).and_then(|nested| nested.as_deref())
    }

    /// Registered tokens in lexical order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether `token` can appear as a language token in a delimiter.
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Nested parsers shipped with the grammar, keyed by language token.
pub fn builtin_nested_parser(token: &str) -> Option<Arc<dyn NestedParser>> {
    match token {
        "json" => Some(Arc::new(StringLiteralParser)),
        _ => None,
    }
}
