//! JSON-with-comments reader.
//!
//! VS Code (`settings.json`, `keybindings.json`) and Windows Terminal
//! (`settings.json`) write their configuration in a JSON dialect that allows
//! `//` line comments and `/* */` block comments.  `serde_json` rejects those,
//! so every JSON store runs its input through [`strip_comments`] first.
//!
//! # How the stripper works
//!
//! The input is scanned character by character with a tiny state machine:
//!
//! ```text
//! Code ──"──► String ──\──► Escape ──any──► String
//!  │            └──"──► Code
//!  ├──//──► LineComment ──\n──► Code
//!  └──/*──► BlockComment ──*/──► Code
//! ```
//!
//! Comment characters are replaced by spaces (newlines are kept) so byte
//! offsets and line numbers in `serde_json` error messages still point at the
//! right place in the original file.  Text inside string literals is never
//! touched, so a URL such as `"https://example.com"` survives intact.
//!
//! # What is NOT accepted
//!
//! - Trailing commas (`[1, 2,]`) are left in place and surface as a parse
//!   error.  The stores never guess at a repair.
//! - An unterminated `/*` comment is an error rather than "comment to EOF".
//!
//! Comments are not preserved when a store writes the document back.

use serde_json::Value;
use thiserror::Error;

/// Error type for JSON-with-comments parsing.
#[derive(Debug, Error)]
pub enum JsoncError {
    /// A `/*` comment was opened but never closed.
    #[error("unterminated block comment starting on line {line}")]
    UnterminatedBlockComment { line: usize },

    /// The comment-free text is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    String,
    Escape,
    LineComment,
    BlockComment,
}

/// Removes `//` and `/* */` comments that appear outside string literals.
///
/// A leading UTF-8 byte-order mark is dropped as well.
///
/// # Errors
///
/// Returns [`JsoncError::UnterminatedBlockComment`] if a block comment runs
/// to the end of the input.
pub fn strip_comments(input: &str) -> Result<String, JsoncError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;
    let mut line = 1;
    let mut block_start_line = 0;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '"' => {
                    state = State::String;
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                    out.push_str("  ");
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                    block_start_line = line;
                    out.push_str("  ");
                }
                _ => out.push(c),
            },
            State::String => {
                match c {
                    '\\' => state = State::Escape,
                    '"' => state = State::Code,
                    _ => {}
                }
                out.push(c);
            }
            State::Escape => {
                state = State::String;
                out.push(c);
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                    out.push(c);
                } else {
                    blank(&mut out, c);
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                    out.push_str("  ");
                } else if c == '\n' {
                    out.push(c);
                } else {
                    blank(&mut out, c);
                }
            }
        }
        if c == '\n' {
            line += 1;
        }
    }

    if state == State::BlockComment {
        return Err(JsoncError::UnterminatedBlockComment {
            line: block_start_line,
        });
    }
    Ok(out)
}

/// Parses JSON-with-comments text.
///
/// Returns `Ok(None)` when the input holds nothing but whitespace and
/// comments; the stores treat such a file the same as a missing one.
///
/// # Errors
///
/// Returns [`JsoncError`] if a block comment is unterminated or the remaining
/// text is not valid JSON.
pub fn parse(input: &str) -> Result<Option<Value>, JsoncError> {
    let stripped = strip_comments(input)?;
    if stripped.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&stripped)?))
}

/// Keeps line breaks and column widths aligned for blanked comment text.
fn blank(out: &mut String, c: char) {
    if c == '\r' || c == '\t' {
        out.push(c);
    } else {
        out.push(' ');
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
