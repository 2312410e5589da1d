//! Textual staging representation of a keyword.
//!
//! The lexer produces these; the typing engine turns them into deck
//! records. Nothing here outlives the keyword being read.

use super::location::Location;

/// One whitespace-separated token, quotes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub text: String,
    pub line: u32,
}

impl RawToken {
    pub fn new(text: impl Into<String>, line: u32) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }

    /// True for tokens written as `'...'` or `"..."`.
    pub fn is_quoted(&self) -> bool {
        is_quoted(&self.text)
    }
}

pub(crate) fn is_quoted(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
}

/// Text inside the quotes, or the text itself when unquoted.
pub(crate) fn unquote(text: &str) -> &str {
    if is_quoted(text) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Tokens of one slash-terminated record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub tokens: Vec<RawToken>,
    /// Where the record starts.
    pub location: Location,
}

impl RawRecord {
    pub fn new(tokens: Vec<RawToken>, location: Location) -> Self {
        Self { tokens, location }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// How reading a keyword's records ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every expected record or the terminator was read.
    Complete,
    /// A recognized keyword header appeared first.
    NextKeyword,
    /// The input ended first.
    EndOfInput,
}

/// A keyword occurrence as read from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeyword {
    pub name: String,
    pub location: Location,
    pub records: Vec<RawRecord>,
    /// Record counts at which sub-tables end, for table collections.
    pub table_ends: Vec<usize>,
    pub termination: Termination,
}

impl RawKeyword {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            records: Vec::new(),
            table_ends: Vec::new(),
            termination: Termination::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.termination == Termination::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        assert!(is_quoted("'PROD'"));
        assert!(is_quoted("\"a b\""));
        assert!(!is_quoted("'PROD\""));
        assert!(!is_quoted("'"));
        assert_eq!(unquote("'PROD 1'"), "PROD 1");
        assert_eq!(unquote("PROD"), "PROD");
    }
}
