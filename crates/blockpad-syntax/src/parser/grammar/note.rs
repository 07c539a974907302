//! Blocks (`NOTE`) and their bodies (`NOTE_CONTENT`).

use std::ops::Range;

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

use super::delimiter;

/// Parse the implicit block that precedes the first delimiter.
pub(super) fn leading_note(p: &mut Parser<'_, '_>) {
    let m = p.start();
    note_content(p, None);
    m.complete(p, SyntaxKind::NOTE);
}

/// Parse a delimiter and the block body that follows it.
pub(super) fn note(p: &mut Parser<'_, '_>) {
    if delimiter::delimiter_len(p, 0).is_none() {
        return leading_note(p);
    }

    // NEWLINE SENTINEL WORD
    let language = p.nth_text(2);
    let delimiter = delimiter::delimiter(p);
    let m = delimiter.precede(p);
    note_content(p, Some(language));
    m.complete(p, SyntaxKind::NOTE);
}

/// Consume tokens up to the next delimiter that is not shielded by the
/// block language's nested parser.
fn note_content(p: &mut Parser<'_, '_>, language: Option<&str>) {
    let m = p.start();

    let start = p.nth_offset(0);
    let mut protected: Vec<Range<usize>> = language
        .and_then(|language| p.languages().nested(language))
        .map(|nested| nested.protected_spans(p.rest()))
        .unwrap_or_default();
    protected.sort_by_key(|span| span.start);
    let mut next_span = 0;

    while !p.at_end() {
        if p.at(SyntaxKind::NEWLINE) && delimiter::delimiter_len(p, 0).is_some() {
            let relative = p.nth_offset(0) - start;
            while next_span < protected.len() && protected[next_span].end <= relative {
                next_span += 1;
            }
            let shielded = protected[next_span..]
                .iter()
                .take_while(|span| span.start <= relative)
                .any(|span| span.contains(&relative));
            if !shielded {
                break;
            }
        }
        p.bump();
    }

    m.complete(p, SyntaxKind::NOTE_CONTENT);
}

#[cfg(test)]
mod tests {
    use std::ops::Range;
    use std::sync::Arc;

    use crate::language::{LanguageTable, NestedParser};
    use crate::parser::parse;
    use crate::syntax_kind::{SyntaxKind, SyntaxNode};
    use pretty_assertions::assert_eq;

    fn contents(tree: &SyntaxNode) -> Vec<String> {
        tree.descendants()
            .filter(|n| n.kind() == SyntaxKind::NOTE_CONTENT)
            .map(|n| n.text().to_string())
            .collect()
    }

    fn languages() -> LanguageTable {
        LanguageTable::from_tokens(["text", "json", "python"]).unwrap()
    }

    #[test]
    fn three_blocks() {
        let tree = parse("\n∞∞∞text\nA\n∞∞∞text\nB\n∞∞∞text\nC", &languages());
        assert_eq!(contents(&tree), vec!["A", "B", "C"]);
    }

    #[test]
    fn leading_text_becomes_implicit_block() {
        let tree = parse("hello\n∞∞∞text\nworld", &languages());
        let notes: Vec<SyntaxNode> = tree.children().collect();
        assert_eq!(notes.len(), 2);
        assert!(notes[0]
            .children()
            .all(|n| n.kind() != SyntaxKind::DELIMITER));
        assert_eq!(contents(&tree), vec!["hello", "world"]);
    }

    #[test]
    fn empty_block_between_delimiters() {
        let tree = parse("\n∞∞∞text\n\n∞∞∞python\nx", &languages());
        assert_eq!(contents(&tree), vec!["", "x"]);
    }

    #[test]
    fn consecutive_delimiter_lines_are_content() {
        // The second sentinel line has no newline of its own in front of it
        let tree = parse("\n∞∞∞text\n∞∞∞text\nx", &languages());
        assert_eq!(contents(&tree), vec!["∞∞∞text\nx"]);
    }

    /// `/* ... */` comments, which may span lines.
    #[derive(Debug)]
    struct BlockComments;

    impl NestedParser for BlockComments {
        fn protected_spans(&self, text: &str) -> Vec<Range<usize>> {
            let mut spans = Vec::new();
            let mut from = 0;
            while let Some(open) = text[from..].find("/*") {
                let start = from + open;
                let Some(close) = text[start + 2..].find("*/") else {
                    break;
                };
                let end = start + 2 + close + 2;
                spans.push(start..end);
                from = end;
            }
            spans
        }
    }

    #[test]
    fn multi_line_construct_shields_delimiter_lookalike() {
        let mut languages = languages();
        languages
            .register("css", Some(Arc::new(BlockComments)))
            .unwrap();
        let input = "\n∞∞∞css\n/* x\n∞∞∞text\ny */\n∞∞∞text\nafter";
        let tree = parse(input, &languages);
        assert_eq!(
            contents(&tree),
            vec!["/* x\n∞∞∞text\ny */", "after"]
        );
    }

    #[test]
    fn json_string_never_spans_a_delimiter() {
        let input = "\n∞∞∞json\n{\"a\": \"x\n∞∞∞text\ny\"}";
        let tree = parse(input, &languages());
        assert_eq!(contents(&tree), vec!["{\"a\": \"x", "y\"}"]);
    }

    #[test]
    fn open_quote_does_not_pair_with_later_block() {
        let input = "\n∞∞∞json\n{\"\n∞∞∞text\nshe said \"hi\"";
        let tree = parse(input, &languages());
        assert_eq!(contents(&tree), vec!["{\"", "she said \"hi\""]);
    }

    #[test]
    fn lookalike_in_non_nested_language_splits() {
        let input = "\n∞∞∞python\ns = \"x\n∞∞∞text\ny\"";
        let tree = parse(input, &languages());
        assert_eq!(contents(&tree), vec!["s = \"x", "y\""]);
    }

    #[test]
    fn unterminated_json_string_does_not_swallow_blocks() {
        let input = "\n∞∞∞json\n{\"open\n∞∞∞text\nnext";
        let tree = parse(input, &languages());
        assert_eq!(contents(&tree), vec!["{\"open", "next"]);
    }
}
