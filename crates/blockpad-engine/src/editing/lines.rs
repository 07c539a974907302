//! Line arithmetic over document text.
//!
//! Lines are split on `\n` only; a trailing newline produces a final empty
//! line, so a text always has `newline count + 1` lines.

use std::ops::Range;

/// Byte span of every line, newline excluded.
pub fn line_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    for line in text.split('\n') {
        spans.push(start..start + line.len());
        start += line.len() + 1;
    }
    spans
}

pub fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |i| i + 1)
}

/// Offset of the newline ending the line at `pos`, or the text length.
pub fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |i| pos + i)
}

/// Index of the line containing `pos`.
pub fn line_index(spans: &[Range<usize>], pos: usize) -> usize {
    spans
        .iter()
        .position(|span| pos <= span.end)
        .unwrap_or_else(|| spans.len().saturating_sub(1))
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Largest char boundary not after `pos`.
pub fn floor_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Smallest char boundary not before `pos`.
pub fn ceil_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

/// Byte offset `columns` characters into `line`, or the end of the line.
pub fn offset_of_column(line: &str, columns: usize) -> usize {
    line.char_indices()
        .nth(columns)
        .map_or(line.len(), |(offset, _)| offset)
}
