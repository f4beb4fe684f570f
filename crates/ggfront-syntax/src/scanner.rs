//! Comment stripping line reader.
//!
//! VHDL has two comment forms: `--` runs to the end of the line and
//! `/* ... */` (VHDL-2008) may span lines. Both delimiters are ignored
//! inside a string literal, where a doubled quote (`""`) is an escaped quote.

use std::str::Lines;

/// State carried between lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// True while inside an unterminated `/*` block comment.
    pub in_block_comment: bool,
}

/// Reads logical lines of a source text with comments removed.
///
/// Returns `None` once the input is exhausted, which is distinct from an
/// empty line (`Some("")`).
#[derive(Debug, Clone)]
pub struct LineScanner<'a> {
    lines: Lines<'a>,
    state: ScanState,
}

impl<'a> LineScanner<'a> {
    /// Create a scanner over the given text.
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            state: ScanState::default(),
        }
    }

    /// Current state (whether a block comment is open).
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Read the next line with comments stripped and trailing whitespace trimmed.
    pub fn next_line(&mut self) -> Option<String> {
        let raw = self.lines.next()?;
        Some(strip_comments(raw, &mut self.state))
    }
}

impl Iterator for LineScanner<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line()
    }
}

/// Strips comments from a single line, updating the block-comment state.
#[must_use]
pub fn strip_comments(line: &str, state: &mut ScanState) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    // Start of the run of text that is currently being kept.
    let mut kept_from = 0;
    let mut index = 0;

    while index < bytes.len() {
        if state.in_block_comment {
            if bytes[index..].starts_with(b"*/") {
                state.in_block_comment = false;
                index += 2;
                kept_from = index;
            } else {
                index += 1;
            }
            continue;
        }

        match bytes[index] {
            b'"' if !is_character_literal(bytes, index) => {
                if let Some(end) = literal_end(bytes, index) {
                    index = end;
                    continue;
                }
            }
            b'-' if bytes.get(index + 1) == Some(&b'-') => {
                out.push_str(&line[kept_from..index]);
                return trim_end_owned(out);
            }
            b'/' if bytes.get(index + 1) == Some(&b'*') => {
                out.push_str(&line[kept_from..index]);
                state.in_block_comment = true;
                index += 2;
                continue;
            }
            _ => {}
        }
        index += 1;
    }

    if !state.in_block_comment && kept_from < bytes.len() {
        out.push_str(&line[kept_from..]);
    }
    trim_end_owned(out)
}

/// `'"'` is a character literal, not the start of a string.
fn is_character_literal(bytes: &[u8], quote: usize) -> bool {
    quote > 0 && bytes[quote - 1] == b'\''
}

/// Returns the index just past the closing quote of the literal opened at
/// `open`, or `None` when the literal is not closed on this line.
fn literal_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut index = open + 1;
    while index < bytes.len() {
        if bytes[index] == b'"' {
            if bytes.get(index + 1) == Some(&b'"') {
                index += 2;
                continue;
            }
            return Some(index + 1);
        }
        index += 1;
    }
    None
}

fn trim_end_owned(mut text: String) -> String {
    text.truncate(text.trim_end().len());
    text
}
