//! Delimiter lines: `\n∞∞∞<language>(-a)?(;key=value)*\n`.

use crate::parser::{CompletedMarker, Parser};
use crate::syntax_kind::SyntaxKind;

/// Number of tokens spanned by a delimiter starting `n` tokens ahead, or
/// `None` when the tokens there do not form a delimiter.
///
/// The language token must be registered in the parser's language table.
pub(super) fn delimiter_len(p: &Parser<'_, '_>, n: usize) -> Option<usize> {
    if p.nth(n) != SyntaxKind::NEWLINE
        || p.nth(n + 1) != SyntaxKind::SENTINEL
        || p.nth(n + 2) != SyntaxKind::WORD
        || !p.languages().contains(p.nth_text(n + 2))
    {
        return None;
    }

    let mut i = n + 3;
    if at_auto_flag(p, i) {
        i += 2;
    }

    while p.nth(i) == SyntaxKind::SEMICOLON {
        i += 1;
        let key_start = i;
        while matches!(p.nth(i), SyntaxKind::WORD | SyntaxKind::DASH) {
            i += 1;
        }
        if i == key_start || p.nth(i) != SyntaxKind::EQ {
            return None;
        }
        i += 1;
        while !matches!(
            p.nth(i),
            SyntaxKind::SEMICOLON | SyntaxKind::NEWLINE | SyntaxKind::EOF
        ) {
            i += 1;
        }
    }

    (p.nth(i) == SyntaxKind::NEWLINE).then_some(i + 1 - n)
}

fn at_auto_flag(p: &Parser<'_, '_>, n: usize) -> bool {
    p.nth(n) == SyntaxKind::DASH && p.nth(n + 1) == SyntaxKind::WORD && p.nth_text(n + 1) == "a"
}

/// Parse a delimiter. The caller has checked [`delimiter_len`].
pub(super) fn delimiter(p: &mut Parser<'_, '_>) -> CompletedMarker {
    let m = p.start();

    p.bump(); // NEWLINE
    p.bump(); // SENTINEL

    let language = p.start();
    p.bump();
    language.complete(p, SyntaxKind::LANGUAGE);

    if at_auto_flag(p, 0) {
        let auto = p.start();
        p.bump();
        p.bump();
        auto.complete(p, SyntaxKind::AUTO_FLAG);
    }

    while p.at(SyntaxKind::SEMICOLON) {
        metadata(p);
    }

    p.eat(SyntaxKind::NEWLINE);

    m.complete(p, SyntaxKind::DELIMITER)
}

fn metadata(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // SEMICOLON

    let key = p.start();
    while matches!(p.current(), SyntaxKind::WORD | SyntaxKind::DASH) {
        p.bump();
    }
    key.complete(p, SyntaxKind::METADATA_KEY);

    p.eat(SyntaxKind::EQ);

    let value = p.start();
    while !p.at_end() && !matches!(p.current(), SyntaxKind::SEMICOLON | SyntaxKind::NEWLINE) {
        p.bump();
    }
    value.complete(p, SyntaxKind::METADATA_VALUE);

    m.complete(p, SyntaxKind::METADATA);
}
