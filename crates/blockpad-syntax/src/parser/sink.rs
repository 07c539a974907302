//! Replays parser events against the token stream into a Rowan green tree.

use std::slice;

use rowan::GreenNodeBuilder;

use crate::lexer::Token;
use crate::parser::event::Event;
use crate::syntax_kind::{SyntaxKind, SyntaxNode};

pub struct Sink<'t, 'input> {
    builder: GreenNodeBuilder<'static>,
    tokens: slice::Iter<'t, Token<'input>>,
    events: Vec<Event>,
}

impl<'t, 'input> Sink<'t, 'input> {
    pub fn new(tokens: &'t [Token<'input>], events: Vec<Event>) -> Self {
        Self {
            builder: GreenNodeBuilder::new(),
            tokens: tokens.iter(),
            events,
        }
    }

    pub fn build(mut self) -> SyntaxNode {
        for i in 0..self.events.len() {
            match std::mem::replace(&mut self.events[i], Event::Placeholder) {
                Event::Start {
                    kind,
                    forward_parent,
                } => {
                    for kind in self.take_parents(kind, forward_parent).into_iter().rev() {
                        self.builder.start_node(kind.into());
                    }
                }
                Event::Token => {
                    if let Some(token) = self.tokens.next() {
                        self.builder.token(token.kind.into(), token.text);
                    }
                }
                Event::Finish => self.builder.finish_node(),
                Event::Placeholder => {}
            }
        }

        SyntaxNode::new_root(self.builder.finish())
    }

    /// `kind` followed by the kinds of the nodes preceding it, innermost
    /// first. Their `Start` events are consumed so they open only once.
    fn take_parents(&mut self, kind: SyntaxKind, mut next: Option<usize>) -> Vec<SyntaxKind> {
        let mut kinds = vec![kind];
        while let Some(index) = next {
            next = match std::mem::replace(&mut self.events[index], Event::Placeholder) {
                Event::Start {
                    kind,
                    forward_parent,
                } => {
                    kinds.push(kind);
                    forward_parent
                }
                _ => None,
            };
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use pretty_assertions::assert_eq;

    fn start(kind: SyntaxKind) -> Event {
        Event::Start {
            kind,
            forward_parent: None,
        }
    }

    #[test]
    fn tokens_are_read_in_order() {
        let tokens = lex("hi\nthere");
        let mut events = vec![start(SyntaxKind::ROOT), start(SyntaxKind::NOTE_CONTENT)];
        events.extend(std::iter::repeat_n(Event::Token, tokens.len()));
        events.extend([Event::Finish, Event::Finish]);

        let tree = Sink::new(&tokens, events).build();
        assert_eq!(tree.kind(), SyntaxKind::ROOT);
        assert_eq!(tree.text().to_string(), "hi\nthere");
    }

    #[test]
    fn note_wraps_preceded_delimiter() {
        let input = "\n∞∞∞";
        let tokens = lex(input);

        // The DELIMITER opened at 1 is wrapped by the NOTE started at 5
        let events = vec![
            start(SyntaxKind::ROOT),
            Event::Start {
                kind: SyntaxKind::DELIMITER,
                forward_parent: Some(5),
            },
            Event::Token,
            Event::Token,
            Event::Finish,
            start(SyntaxKind::NOTE),
            Event::Finish,
            Event::Finish,
        ];

        let tree = Sink::new(&tokens, events).build();
        let note = tree.children().next().unwrap();
        assert_eq!(note.kind(), SyntaxKind::NOTE);
        assert_eq!(note.children().next().unwrap().kind(), SyntaxKind::DELIMITER);
        assert_eq!(tree.text().to_string(), input);
    }
}
