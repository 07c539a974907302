//! # Parser - Event-Based Tree Construction
//!
//! This module implements the core parsing logic, transforming a token stream
//! into a syntax tree using the **event-based** architecture from rust-analyzer.
//!
//! ## Why Event-Based Parsing?
//!
//! The grammar decides whether a line is a delimiter only after looking ahead
//! over the whole line. Emitting a flat list of **events** ([`Event`]) keeps
//! that speculation cheap: nothing is built until the [`Sink`] turns the
//! events into a Rowan tree.
//!
//! ## The Event Model
//!
//! Parsing a delimiter produces events like (token kinds in brackets are
//! read from the token stream by the sink, not stored in the event):
//! ```text
//! Start(DELIMITER)
//! Token [NEWLINE]
//! Token [SENTINEL]
//! Start(LANGUAGE) Token [WORD] Finish
//! Token [NEWLINE]
//! Finish
//! ```
//!
//! ## The Marker System
//!
//! When you call `parser.start()`, you get a [`Marker`]. This marker **must**
//! be either completed with `marker.complete(parser, KIND)` or abandoned with
//! `marker.abandon(parser)`. Dropping it without doing either panics.
//!
//! ```ignore
//! let m = parser.start();
//! parser.bump();
//! m.complete(parser, SyntaxKind::LANGUAGE);
//! ```
//!
//! ## Language Awareness
//!
//! Unlike a pure token grammar, the parser carries the [`LanguageTable`]:
//! a delimiter only counts when its language token is registered, and a
//! block's nested parser may shield parts of the block body from delimiter
//! detection. Token byte offsets are kept alongside the tokens for that.
//!
//! ## Public API
//!
//! ```
//! use blockpad_syntax::{LanguageTable, parse};
//!
//! let languages = LanguageTable::from_tokens(["text"]).unwrap();
//! let tree = parse("\n∞∞∞text\nhello", &languages);
//! println!("{:#?}", tree);
//! ```

pub mod event;
pub mod sink;

mod grammar;

use crate::language::LanguageTable;
use crate::lexer::{Token, lex_with_spans};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use event::Event;
use sink::Sink;

/// The parser state machine.
///
/// Holds the token stream, current position, and accumulated events.
/// Grammar functions receive `&mut Parser` and use its methods to:
///
/// - Inspect tokens: `current()`, `nth()`, `nth_text()`, `at()`, `at_end()`
/// - Consume tokens: `bump()`, `eat()`
/// - Build structure: `start()` → `Marker` → `complete()`/`abandon()`
pub struct Parser<'t, 'input> {
    source: &'input str,
    tokens: &'t [Token<'input>],
    offsets: Vec<usize>,
    languages: &'t LanguageTable,
    pos: usize,
    events: Vec<Event>,
}

impl<'t, 'input> Parser<'t, 'input> {
    /// Create a new parser from a slice of tokens lexed from `source`.
    pub fn new(
        source: &'input str,
        tokens: &'t [Token<'input>],
        languages: &'t LanguageTable,
    ) -> Self {
        let mut offsets = Vec::with_capacity(tokens.len());
        let mut offset = 0;
        for token in tokens {
            offsets.push(offset);
            offset += token.text.len();
        }

        Self {
            source,
            tokens,
            offsets,
            languages,
            pos: 0,
            events: Vec::new(),
        }
    }

    /// Parse the tokens and return a syntax tree.
    pub fn parse(mut self) -> SyntaxNode {
        grammar::root(&mut self);
        Sink::new(self.tokens, self.events).build()
    }

    /// Start a new node and return a marker.
    pub fn start(&mut self) -> Marker {
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Look ahead n tokens.
    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    /// Text of the token n positions ahead, empty past the end.
    pub fn nth_text(&self, n: usize) -> &'input str {
        self.tokens.get(self.pos + n).map(|t| t.text).unwrap_or("")
    }

    /// Byte offset of the token n positions ahead (document length past the end).
    pub fn nth_offset(&self, n: usize) -> usize {
        self.offsets
            .get(self.pos + n)
            .copied()
            .unwrap_or(self.source.len())
    }

    /// Check if at end of input.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Check if current token is of given kind.
    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) {
        if !self.at_end() {
            self.events.push(Event::Token);
            self.pos += 1;
        }
    }

    /// Source text from the current token to the end of the document.
    pub fn rest(&self) -> &'input str {
        &self.source[self.nth_offset(0)..]
    }

    pub fn languages(&self) -> &'t LanguageTable {
        self.languages
    }
}

/// A marker for a node being constructed.
///
/// When you call `parser.start()`, a `Placeholder` event is pushed and you
/// get a `Marker` pointing to it. The `#[must_use]` attribute and the `Drop`
/// impl together enforce that every marker is either completed (placeholder
/// becomes `Start`, a `Finish` is pushed) or abandoned (placeholder removed
/// if nothing followed it).
///
/// ```ignore
/// fn language(p: &mut Parser) {
///     let m = p.start();
///     p.bump(); // WORD
///     m.complete(p, SyntaxKind::LANGUAGE);
/// }
/// ```
#[must_use = "Markers must be completed or abandoned, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    /// Tracks whether complete() or abandon() was called
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a node of the given kind.
    ///
    /// This:
    /// 1. Replaces the `Placeholder` at our position with `Start { kind, ... }`
    /// 2. Pushes a `Finish` event
    /// 3. Returns a `CompletedMarker` for potential `precede()` calls
    pub fn complete(mut self, p: &mut Parser<'_, '_>, kind: SyntaxKind) -> CompletedMarker {
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::Start {
            kind,
            forward_parent: None,
        };
        p.events.push(Event::Finish);
        CompletedMarker { pos: self.pos }
    }

    /// Abandon this marker without creating a node.
    ///
    /// Use this when you speculatively started a node but decided not to
    /// create it (e.g., the input didn't match what you expected).
    ///
    /// **Note**: This only removes the placeholder if it's the last event.
    /// If other events were pushed after `start()`, the placeholder becomes
    /// inert and is ignored by the Sink.
    pub fn abandon(mut self, p: &mut Parser<'_, '_>) {
        self.completed = true;
        if self.pos == p.events.len() - 1 {
            match p.events.pop() {
                Some(Event::Placeholder) => {}
                _ => unreachable!(),
            }
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be either completed or abandoned");
        }
    }
}

/// A marker for a node that has been completed.
///
/// The only thing you can do with a `CompletedMarker` is call `precede()`
/// to wrap the completed node in a new parent. The grammar uses this to wrap
/// an already-parsed delimiter into the `NOTE` that also holds its content:
///
/// ```ignore
/// let delimiter = delimiter(p);       // CompletedMarker
/// let note = delimiter.precede(p);    // NOTE starts before the delimiter
/// note_content(p);
/// note.complete(p, SyntaxKind::NOTE); // NOTE = [DELIMITER, NOTE_CONTENT]
/// ```
///
/// This works by setting a `forward_parent` link that the Sink resolves.
#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    /// Position of the Start event for this completed node
    pos: usize,
}

impl CompletedMarker {
    /// Create a new parent node that will contain this node.
    ///
    /// Returns a new `Marker` that, when completed, will become the parent
    /// of the node at `self.pos`.
    pub fn precede(self, p: &mut Parser<'_, '_>) -> Marker {
        let new_pos = p.events.len();
        p.events.push(Event::Placeholder);

        // Update the original Start event to point to this new parent
        if let Event::Start { forward_parent, .. } = &mut p.events[self.pos] {
            *forward_parent = Some(new_pos);
        }

        Marker {
            pos: new_pos,
            completed: false,
        }
    }
}

/// Parse a block document into a syntax tree.
pub fn parse(source: &str, languages: &LanguageTable) -> SyntaxNode {
    let tokens: Vec<Token<'_>> = lex_with_spans(source)
        .into_iter()
        .map(|(token, _)| token)
        .collect();
    let parser = Parser::new(source, &tokens, languages);
    parser.parse()
}
