use std::collections::BTreeSet;
use std::ops::Range;

use blockpad_syntax::LanguageTable;

use crate::blocks::Delimiter;
use crate::blocks::delimiter::serialize;
use crate::editing::Document;
use crate::editing::changes::{Change, ChangeSet, Origin, Selection, Transaction};
use crate::editing::lines::{
    ceil_char_boundary, floor_char_boundary, is_blank, line_end, line_index, line_spans,
    line_start, offset_of_column,
};
use crate::error::EngineError;

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: Range<usize>,
    },
    ReplaceRange {
        range: Range<usize>,
        text: String,
    },
    /// Replace every range with the same text, leaving delimiters alone
    ReplaceAll {
        ranges: Vec<Range<usize>>,
        text: String,
    },
    CursorCharLeft,
    CursorCharRight,
    SelectCharLeft,
    SelectCharRight,
    CursorLineUp,
    CursorLineDown,
    GotoNextBlock,
    GotoPreviousBlock,
    SelectNextBlock,
    SelectPreviousBlock,
    GotoNextParagraph,
    GotoPreviousParagraph,
    SelectNextParagraph,
    SelectPreviousParagraph,
    /// Select the active block's content, then the whole document
    SelectAll,
    AddBlockAfterCurrent,
    AddBlockBeforeCurrent,
    AddBlockAtEnd,
    AddBlockAtStart,
    MoveLineUp,
    MoveLineDown,
    DeleteLine,
    ChangeLanguage {
        token: String,
        auto: bool,
    },
}

/// Compile a command into a transaction against the current document
pub(crate) fn compile(doc: &Document, cmd: &Cmd) -> Result<Transaction, EngineError> {
    let len = doc.len();
    let tx = match cmd {
        Cmd::InsertText { at, text } => {
            let at = doc.floor_boundary(*at);
            Transaction::new(Origin::Input)
                .with_changes(ChangeSet::new(len, [Change::insert(at, text.clone())]))
                .with_selection(Selection::caret(at + text.len()))
        }
        Cmd::DeleteRange { range } => {
            let range = doc.floor_range(range);
            let caret = Selection::caret(range.start);
            Transaction::new(Origin::Input)
                .with_changes(ChangeSet::new(len, [Change::delete(range)]))
                .with_selection(caret)
        }
        Cmd::ReplaceRange { range, text } => {
            let range = doc.floor_range(range);
            let caret = Selection::caret(range.start + text.len());
            Transaction::new(Origin::Input)
                .with_changes(ChangeSet::new(len, [Change::new(range, text.clone())]))
                .with_selection(caret)
        }
        Cmd::ReplaceAll { ranges, text } => {
            let changes = ranges
                .iter()
                .map(|range| Change::new(doc.floor_range(range), text.clone()));
            Transaction::new(Origin::ReplaceAll).with_changes(ChangeSet::new(len, changes))
        }
        Cmd::CursorCharLeft => char_motion(doc, false, false),
        Cmd::CursorCharRight => char_motion(doc, true, false),
        Cmd::SelectCharLeft => char_motion(doc, false, true),
        Cmd::SelectCharRight => char_motion(doc, true, true),
        Cmd::CursorLineUp => line_motion(doc, true),
        Cmd::CursorLineDown => line_motion(doc, false),
        Cmd::GotoNextBlock => move_head(doc, next_block_target(doc), false),
        Cmd::GotoPreviousBlock => move_head(doc, previous_block_target(doc), false),
        Cmd::SelectNextBlock => move_head(doc, next_block_target(doc), true),
        Cmd::SelectPreviousBlock => move_head(doc, previous_block_target(doc), true),
        Cmd::GotoNextParagraph => move_head(doc, paragraph_target(doc, true), false),
        Cmd::GotoPreviousParagraph => move_head(doc, paragraph_target(doc, false), false),
        Cmd::SelectNextParagraph => move_head(doc, paragraph_target(doc, true), true),
        Cmd::SelectPreviousParagraph => move_head(doc, paragraph_target(doc, false), true),
        Cmd::SelectAll => select_all(doc),
        Cmd::AddBlockAfterCurrent => {
            let index = doc.active_index();
            match doc.blocks().get(index) {
                Some(block) => add_block_at(doc, block.content.end),
                None => add_block_at(doc, len),
            }
        }
        Cmd::AddBlockBeforeCurrent => add_block_before(doc, doc.active_index()),
        Cmd::AddBlockAtEnd => add_block_at(doc, len),
        Cmd::AddBlockAtStart => add_block_before(doc, 0),
        Cmd::MoveLineUp => move_lines(doc, true),
        Cmd::MoveLineDown => move_lines(doc, false),
        Cmd::DeleteLine => delete_line(doc),
        Cmd::ChangeLanguage { token, auto } => {
            change_language(doc, doc.active_index(), token, *auto, Origin::ChangeLanguage)?
        }
    };
    Ok(tx)
}

fn move_head(doc: &Document, target: usize, extend: bool) -> Transaction {
    let selection = if extend {
        Selection::new(doc.selection.anchor, target)
    } else {
        Selection::caret(target)
    };
    Transaction::new(Origin::Input).with_selection(selection)
}

/// Treat every delimiter as one atomic character: a position strictly inside
/// one snaps to the edge the caret was travelling towards.
fn skip_delimiter(doc: &Document, pos: usize, forward: bool) -> usize {
    match doc.block_list().delimiter_around(pos) {
        Some(delimiter) if forward => delimiter.end,
        Some(delimiter) => delimiter.start,
        None => pos,
    }
}

fn char_motion(doc: &Document, forward: bool, extend: bool) -> Transaction {
    let selection = doc.selection;
    if !extend && !selection.is_caret() {
        let target = if forward {
            selection.to()
        } else {
            selection.from()
        };
        return move_head(doc, target, false);
    }

    let text = doc.text();
    let head = selection.head.min(text.len());
    let target = if forward {
        ceil_char_boundary(&text, head + 1)
    } else if head == 0 {
        0
    } else {
        floor_char_boundary(&text, head - 1)
    };
    move_head(doc, skip_delimiter(doc, target, forward), extend)
}

fn line_motion(doc: &Document, up: bool) -> Transaction {
    let text = doc.text();
    let head = floor_char_boundary(&text, doc.selection.head);
    let spans = line_spans(&text);
    let index = line_index(&spans, head);
    let column = text[spans[index].start..head].chars().count();

    let target_line = if up {
        index.checked_sub(1)
    } else {
        Some(index + 1).filter(|&next| next < spans.len())
    };
    let target = match target_line {
        Some(line) => {
            let span = spans[line].clone();
            span.start + offset_of_column(&text[span], column)
        }
        None if up => 0,
        None => text.len(),
    };
    move_head(doc, skip_delimiter(doc, target, !up), false)
}

fn next_block_target(doc: &Document) -> usize {
    let list = doc.block_list();
    let index = doc.active_index();
    match (list.get(index + 1), list.get(index)) {
        (Some(next), _) => next.content.start,
        (None, Some(current)) => current.content.end,
        (None, None) => doc.len(),
    }
}

fn previous_block_target(doc: &Document) -> usize {
    let list = doc.block_list();
    let index = doc.active_index();
    let Some(current) = list.get(index) else {
        return 0;
    };
    if doc.selection.head > current.content.start || index == 0 {
        return current.content.start;
    }
    list.get(index - 1)
        .map_or(current.content.start, |previous| previous.content.start)
}

/// Next or previous paragraph edge, crossing into the neighbouring block at
/// a content edge.
fn paragraph_target(doc: &Document, forward: bool) -> usize {
    let list = doc.block_list();
    let index = doc.active_index();
    let Some(block) = list.get(index) else {
        return doc.selection.head;
    };
    let content = block.content.clone();
    let body = doc.slice(content.clone());
    let head = doc.selection.head.clamp(content.start, content.end) - content.start;

    let within = if forward {
        next_paragraph_edge(&body, head)
    } else {
        previous_paragraph_edge(&body, head)
    };
    match within {
        Some(offset) => content.start + offset,
        None if forward => list
            .get(index + 1)
            .map_or(content.end, |next| next.content.start),
        None => index
            .checked_sub(1)
            .and_then(|previous| list.get(previous))
            .map_or(content.start, |previous| previous.content.end),
    }
}

/// Start of the blank line after the paragraph at or below `head`, or the
/// end of `body`. `None` when `head` is already at the end.
fn next_paragraph_edge(body: &str, head: usize) -> Option<usize> {
    if head >= body.len() {
        return None;
    }
    let spans = line_spans(body);
    let mut line = line_index(&spans, head);
    while line < spans.len() && is_blank(&body[spans[line].clone()]) {
        line += 1;
    }
    while line < spans.len() && !is_blank(&body[spans[line].clone()]) {
        line += 1;
    }
    Some(spans.get(line).map_or(body.len(), |span| span.start))
}

/// Start of the blank line before the paragraph at or above `head`, or `0`.
/// `None` when `head` is already at the start.
fn previous_paragraph_edge(body: &str, head: usize) -> Option<usize> {
    if head == 0 {
        return None;
    }
    let spans = line_spans(body);
    let line = line_index(&spans, head);
    // Lines left to scan are 0..remaining
    let mut remaining = if head == spans[line].start { line } else { line + 1 };
    while remaining > 0 && is_blank(&body[spans[remaining - 1].clone()]) {
        remaining -= 1;
    }
    while remaining > 0 && !is_blank(&body[spans[remaining - 1].clone()]) {
        remaining -= 1;
    }
    Some(
        remaining
            .checked_sub(1)
            .map_or(0, |blank| spans[blank].start),
    )
}

fn select_all(doc: &Document) -> Transaction {
    let Some(block) = doc.active_block() else {
        return Transaction::new(Origin::SelectDocument)
            .with_selection(Selection::new(0, doc.len()));
    };
    let content = block.content.clone();
    if doc.selection.range() == content {
        Transaction::new(Origin::SelectDocument).with_selection(Selection::new(0, doc.len()))
    } else {
        Transaction::new(Origin::Input).with_selection(Selection::new(content.start, content.end))
    }
}

fn new_delimiter(doc: &Document) -> String {
    serialize(
        &doc.settings.default_language,
        doc.settings.default_auto,
        Some(doc.clock.now()),
    )
}

fn add_block_at(doc: &Document, at: usize) -> Transaction {
    let delimiter = new_delimiter(doc);
    let caret = at + delimiter.len();
    Transaction::new(Origin::AddBlock)
        .with_changes(ChangeSet::new(doc.len(), [Change::insert(at, delimiter)]))
        .with_selection(Selection::caret(caret))
}

fn add_block_before(doc: &Document, index: usize) -> Transaction {
    let Some(block) = doc.blocks().get(index) else {
        return add_block_at(doc, 0);
    };
    if !block.is_implicit() || block.content.is_empty() {
        return add_block_at(doc, block.delimiter.start);
    }

    // Text before the first delimiter gets a delimiter of its own so it
    // stays a separate block below the new one.
    let delimiter = new_delimiter(doc);
    let caret = delimiter.len();
    let insert = delimiter + &serialize(&doc.settings.default_language, false, None);
    Transaction::new(Origin::AddBlock)
        .with_changes(ChangeSet::new(doc.len(), [Change::insert(0, insert)]))
        .with_selection(Selection::caret(caret))
}

/// Rewrite the delimiter of block `index` to `token`.
///
/// The delimiter text is re-read from the buffer; if it no longer parses as
/// the delimiter the block list recorded, nothing is changed and a
/// [`EngineError::StructuralDesync`] is returned.
pub(crate) fn change_language(
    doc: &Document,
    index: usize,
    token: &str,
    auto: bool,
    origin: Origin,
) -> Result<Transaction, EngineError> {
    if !doc.languages.contains(token) {
        return Err(EngineError::UnknownLanguage(token.to_string()));
    }
    let block = doc
        .blocks()
        .get(index)
        .ok_or_else(|| EngineError::StructuralDesync {
            block: index,
            found: String::new(),
        })?;

    let change = if block.is_implicit() {
        Change::insert(0, serialize(token, auto, None))
    } else {
        let found = doc.slice(block.delimiter.clone());
        let delimiter = Delimiter::parse(&found, &doc.languages)
            .filter(|delimiter| delimiter.language == block.language && delimiter.auto == block.auto)
            .ok_or_else(|| EngineError::StructuralDesync {
                block: index,
                found: found.clone(),
            })?;
        Change::new(
            block.delimiter.clone(),
            delimiter.with_language(token, auto).to_text(),
        )
    };

    Ok(Transaction::new(origin).with_changes(ChangeSet::new(doc.len(), [change])))
}

/// First and last line index covered by the selection. A selection ending at
/// the start of a line does not include that line.
fn selected_lines(spans: &[Range<usize>], selection: Selection) -> (usize, usize) {
    let first = line_index(spans, selection.from());
    let mut last = line_index(spans, selection.to());
    if last > first && selection.to() == spans[last].start {
        last -= 1;
    }
    (first, last)
}

fn move_lines(doc: &Document, up: bool) -> Transaction {
    let noop = Transaction::new(Origin::MoveLines);
    let text = doc.text();
    let spans = line_spans(&text);
    let selection = doc.selection.clamp(text.len());
    let (first, last) = selected_lines(&spans, selection);

    // The first delimiter occupies lines 0 (empty) and 1
    let min_line = if doc.block_list().first_delimiter_end > 0 {
        2
    } else {
        0
    };
    if first < min_line || (up && first == min_line) || (!up && last + 1 >= spans.len()) {
        return noop;
    }

    let mut lines: Vec<(&str, Option<usize>)> = spans
        .iter()
        .enumerate()
        .map(|(index, span)| (&text[span.clone()], Some(index)))
        .collect();
    let displaced = if up { first - 1 } else { last + 1 };
    if up {
        let line = lines.remove(displaced);
        lines.insert(last, line);
    } else {
        let line = lines.remove(displaced);
        lines.insert(first, line);
    }
    let touched: BTreeSet<usize> = (first..=last).chain([displaced]).collect();
    separate_delimiters(&mut lines, &touched, &doc.languages);

    let new_text = lines
        .iter()
        .map(|(line, _)| *line)
        .collect::<Vec<_>>()
        .join("\n");
    let new_spans = line_spans(&new_text);
    let map = |pos: usize| {
        let line = line_index(&spans, pos);
        lines
            .iter()
            .position(|(_, original)| *original == Some(line))
            .map_or(pos, |moved| new_spans[moved].start + (pos - spans[line].start))
    };
    let new_selection = Selection::new(map(selection.anchor), map(selection.head));

    Transaction::new(Origin::MoveLines)
        .with_changes(ChangeSet::new(text.len(), [minimal_change(&text, &new_text)]))
        .with_selection(new_selection)
}

/// Insert empty lines so that no moved line leaves a delimiter-shaped line
/// without its own leading newline: two in a row, one at the very top, or
/// one at the very end without a following newline.
fn separate_delimiters<'a>(
    lines: &mut Vec<(&'a str, Option<usize>)>,
    touched: &BTreeSet<usize>,
    languages: &LanguageTable,
) {
    let is_touched =
        |line: &(&str, Option<usize>)| line.1.is_some_and(|index| touched.contains(&index));
    let is_delimiter = |line: &str| Delimiter::parse_line(line, languages).is_some();

    let mut i = 0;
    while i + 1 < lines.len() {
        if is_delimiter(lines[i].0)
            && is_delimiter(lines[i + 1].0)
            && (is_touched(&lines[i]) || is_touched(&lines[i + 1]))
        {
            lines.insert(i + 1, ("", None));
        }
        i += 1;
    }

    if let Some(last) = lines.last()
        && is_delimiter(last.0)
        && is_touched(last)
    {
        lines.push(("", None));
    }
    if let Some(first) = lines.first()
        && is_delimiter(first.0)
        && is_touched(first)
    {
        lines.insert(0, ("", None));
    }
}

/// One change turning `old` into `new`, trimmed to the differing middle.
fn minimal_change(old: &str, new: &str) -> Change {
    let prefix = old
        .bytes()
        .zip(new.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    let prefix = floor_char_boundary(old, prefix);

    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .bytes()
        .rev()
        .zip(new.bytes().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    let old_end = ceil_char_boundary(old, old.len() - suffix);
    let suffix = old.len() - old_end;

    Change::new(prefix..old_end, &new[prefix..new.len() - suffix])
}

fn delete_line(doc: &Document) -> Transaction {
    let noop = Transaction::new(Origin::DeleteLine);
    let Some(block) = doc.active_block() else {
        return noop;
    };
    let content = block.content.clone();
    let text = doc.text();
    let selection = doc.selection.clamp(text.len());

    let mut to_pos = selection.to().clamp(content.start, content.end);
    let from_pos = selection.from().clamp(content.start, content.end);
    if to_pos > from_pos && to_pos == line_start(&text, to_pos) {
        to_pos -= 1;
    }

    let mut from = line_start(&text, from_pos).max(content.start);
    let mut to = line_end(&text, to_pos).min(content.end);
    if to < content.end {
        to += 1;
    } else if from > content.start {
        from -= 1;
    }
    if from >= to {
        return noop;
    }

    Transaction::new(Origin::DeleteLine)
        .with_changes(ChangeSet::new(text.len(), [Change::delete(from..to)]))
        .with_selection(Selection::caret(from))
}
