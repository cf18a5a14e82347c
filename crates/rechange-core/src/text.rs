//! Indentation and comment-aware scanning helpers for Java source text
//!
//! Offsets are byte offsets. All delimiters scanned for are ASCII, so a
//! returned offset always lies on a character boundary.

use crate::error::{ChangeError, Result};

/// Number of indentation units at the start of `line`
///
/// A tab is one unit; `tab_width` consecutive spaces are one unit.
pub fn indent_of(line: &str, tab_width: usize) -> usize {
    let mut result = 0;
    let mut blanks = 0;
    for c in line.chars() {
        match c {
            '\t' => {
                result += 1;
                blanks = 0;
            }
            ' ' => {
                blanks += 1;
                if blanks == tab_width {
                    result += 1;
                    blanks = 0;
                }
            }
            _ => break,
        }
    }
    result
}

/// Strip `indents` indentation units from the start of `line`
pub fn remove_indent(indents: usize, line: &str, tab_width: usize) -> Result<String> {
    if indents == 0 {
        return Ok(line.to_string());
    }

    let mut found = 0;
    let mut blanks = 0;
    for (i, c) in line.char_indices() {
        match c {
            '\t' => {
                found += 1;
                blanks = 0;
            }
            ' ' => {
                blanks += 1;
                if blanks == tab_width {
                    found += 1;
                    blanks = 0;
                }
            }
            _ => break,
        }
        if found == indents {
            return Ok(line[i + 1..].to_string());
        }
    }
    Err(ChangeError::precondition(format!(
        "line does not have {} indents: {:?}",
        indents, line
    )))
}

/// Strip all leading indentation units from `line`
///
/// Spaces that do not make up a whole unit are kept.
pub fn remove_leading_indents(line: &str, tab_width: usize) -> String {
    let indents = indent_of(line, tab_width);
    // indent_of counted them, so they are there
    remove_indent(indents, line, tab_width).unwrap_or_else(|_| line.to_string())
}

/// `indent` tabs
pub fn create_indent_string(indent: usize) -> String {
    "\t".repeat(indent)
}

/// `line` without leading spaces and tabs
pub fn remove_leading_white_spaces(line: &str) -> &str {
    line.trim_start_matches(&[' ', '\t'][..])
}

/// Whether `line` holds nothing but spaces and tabs
pub fn contains_only_white_spaces(line: &str) -> bool {
    line.chars().all(|c| c == ' ' || c == '\t')
}

/// Whether the last code character across `lines` is a semicolon
///
/// Block and line comments are ignored; a block comment may span lines.
pub fn ends_with_semicolon(lines: &[&str]) -> bool {
    let mut in_comment = false;
    let mut result = false;
    for line in lines {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b';' => {
                    if !in_comment {
                        result = true;
                    }
                }
                b'/' if i + 1 < bytes.len() => match bytes[i + 1] {
                    b'*' => {
                        in_comment = true;
                        i += 1;
                    }
                    b'/' if !in_comment => break,
                    _ => {}
                },
                b'/' => {}
                b'*' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                    in_comment = false;
                    i += 1;
                }
                b'*' | b' ' | b'\t' => {}
                _ => {
                    if !in_comment {
                        result = false;
                    }
                }
            }
            i += 1;
        }
    }
    result
}

/// Offset of the first `search` byte at or after `start`, outside comments
pub fn index_of(text: &str, start: usize, search: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        let c = bytes[i];
        if c == search {
            return Some(i);
        }
        if c == b'/' {
            i = skip_comment(bytes, i)?;
        }
        i += 1;
    }
    None
}

/// Offset of the first character at or after `start` that is not
/// whitespace, a semicolon or inside a comment
pub fn index_of_next_statement_character(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b';' | b' ' | b'\t' | b'\r' | b'\n' => {}
            b'/' => i = skip_comment(bytes, i)?,
            _ => return Some(i),
        }
        i += 1;
    }
    None
}

/// If a comment opens at `slash`, the offset of its last byte; otherwise `slash`
///
/// `None` for a block comment that never closes.
fn skip_comment(bytes: &[u8], slash: usize) -> Option<usize> {
    match bytes.get(slash + 1) {
        Some(b'*') => comment_end(bytes, slash + 2),
        Some(b'/') => Some(line_end(bytes, slash + 2)),
        _ => Some(slash),
    }
}

fn comment_end(bytes: &[u8], start: usize) -> Option<usize> {
    (start..bytes.len().saturating_sub(1))
        .find(|&i| bytes[i] == b'*' && bytes[i + 1] == b'/')
        .map(|i| i + 1)
}

fn line_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => return i,
            b'\r' => {
                return if bytes.get(i + 1) == Some(&b'\n') {
                    i + 1
                } else {
                    i
                }
            }
            _ => i += 1,
        }
    }
    bytes.len().saturating_sub(1)
}
