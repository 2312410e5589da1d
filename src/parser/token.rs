//! Line-level scanning: comments, terminators, tokens and repeat counts.

use super::raw::RawToken;
use crate::schema::is_valid_deck_name;

/// Record terminator.
pub const TERMINATOR: char = '/';

/// Positions in `line` of characters outside quoted strings.
fn unquoted_positions(line: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut quote: Option<char> = None;
    line.char_indices().filter(move |&(_, c)| match quote {
        Some(q) => {
            if c == q {
                quote = None;
            }
            false
        }
        None => {
            if c == '\'' || c == '"' {
                quote = Some(c);
                false
            } else {
                true
            }
        }
    })
}

/// Drop a `--` comment. Dashes inside quotes do not start a comment.
pub fn strip_comment(line: &str) -> &str {
    let mut previous_dash: Option<usize> = None;
    for (i, c) in unquoted_positions(line) {
        if c == '-' {
            if previous_dash == Some(i.wrapping_sub(1)) {
                return &line[..i - 1];
            }
            previous_dash = Some(i);
        }
    }
    line
}

/// Split `line` at the record terminator.
///
/// Returns the text before the terminator and whether one was found. The
/// first unquoted slash ends the record, or the last one when `raw` is set.
/// Text after the terminator is discarded.
pub fn split_terminator(line: &str, raw: bool) -> (&str, bool) {
    let mut slashes = unquoted_positions(line).filter(|&(_, c)| c == TERMINATOR);
    let position = if raw {
        slashes.last()
    } else {
        slashes.next()
    };
    match position {
        Some((i, _)) => (&line[..i], true),
        None => (line, false),
    }
}

/// Keyword name on a header line, if `line` is one.
///
/// A header line starts with a valid deck name and holds no record
/// terminator. Text after the name is ignored.
pub fn header_name(line: &str) -> Option<&str> {
    let (_, terminated) = split_terminator(line, false);
    if terminated {
        return None;
    }
    let word = line.split_whitespace().next()?;
    is_valid_deck_name(word).then_some(word)
}

/// Split a record segment into tokens.
///
/// Whitespace separates tokens. A quoted section never splits, so
/// `'A B'` and `2*'A B'` are single tokens. An unclosed quote runs to the
/// end of the segment.
pub fn tokenize(segment: &str, line: u32) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in segment.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(RawToken::new(std::mem::take(&mut current), line));
                }
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        tokens.push(RawToken::new(current, line));
    }
    tokens
}

/// A token with its repeat count resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat<'t> {
    /// A plain value.
    Single(&'t str),
    /// `N*` (defaulted) or `N*V` (explicit), `*` meaning `1*`.
    Many { count: usize, value: Option<&'t str> },
}

/// Interpret `N*`, `N*V` and `*`.
///
/// Quoted tokens and tokens whose prefix is not a positive count are plain
/// values, so a well pattern like `P*` stays a string.
pub fn split_repeat(text: &str) -> Repeat<'_> {
    if text.starts_with(['\'', '"']) {
        return Repeat::Single(text);
    }
    let Some(star) = text.find('*') else {
        return Repeat::Single(text);
    };

    let (count, rest) = (&text[..star], &text[star + 1..]);
    let count = if count.is_empty() {
        if !rest.is_empty() {
            return Repeat::Single(text);
        }
        1
    } else {
        match count.parse::<usize>() {
            Ok(n) if n > 0 && count.bytes().all(|b| b.is_ascii_digit()) => n,
            _ => return Repeat::Single(text),
        }
    };

    Repeat::Many {
        count,
        value: (!rest.is_empty()).then_some(rest),
    }
}
