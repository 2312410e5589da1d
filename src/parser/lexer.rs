//! Line-oriented lexer for one input source.
//!
//! The lexer walks its text one line at a time. At the top level it
//! reports keyword headers and stray data lines; once a keyword has been
//! matched the driver asks it to read that keyword's records in a given
//! [`RecordShape`].

use std::sync::Arc;

use super::location::Location;
use super::raw::{RawKeyword, RawRecord, RawToken, Termination};
use super::token::{header_name, split_terminator, strip_comment, tokenize};

/// How the records of a keyword are laid out in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordShape {
    /// No records follow.
    None,
    /// Exactly this many records.
    Fixed(usize),
    /// Records up to an empty record.
    Terminated,
    /// Records up to the next recognized keyword or an empty record.
    UntilKeyword,
    /// Sub-tables closed by empty records. With a count the collection ends
    /// after that many sub-tables, otherwise at a second consecutive empty
    /// record.
    Tables(Option<usize>),
    /// Verbatim lines up to a line holding only the end marker.
    Code(String),
    /// The next non-blank line, verbatim.
    Line,
}

/// Something found at the top level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexEvent {
    /// A keyword header line.
    Header { name: String, location: Location },
    /// A line that is not a header, already consumed.
    Text { text: String, location: Location },
}

enum RecordRead {
    Record(RawRecord),
    /// A recognized keyword starts here. Nothing was consumed.
    Keyword,
    EndOfInput,
}

/// Lexer over the text of one file or string.
#[derive(Debug)]
pub struct Lexer {
    source: Arc<str>,
    text: String,
    offset: usize,
    /// Number of the line at `offset`, 1-indexed.
    line: u32,
}

impl Lexer {
    pub fn new(source: impl Into<Arc<str>>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            offset: 0,
            line: 1,
        }
    }

    /// Name used in locations.
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn location(&self, line: u32) -> Location {
        Location::new(Arc::clone(&self.source), line)
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.text.len()
    }

    fn peek_line(&self) -> Option<&str> {
        if self.at_end() {
            return None;
        }
        let rest = &self.text[self.offset..];
        let end = rest.find('\n').unwrap_or(rest.len());
        Some(rest[..end].trim_end_matches('\r'))
    }

    fn advance(&mut self) {
        let rest = &self.text[self.offset..];
        match rest.find('\n') {
            Some(end) => self.offset += end + 1,
            None => self.offset = self.text.len(),
        }
        self.line += 1;
    }

    /// Next line with content after comment removal, not consumed.
    fn peek_content(&mut self) -> Option<(String, u32)> {
        loop {
            let line = self.peek_line()?;
            let content = strip_comment(line);
            if content.trim().is_empty() {
                self.advance();
                continue;
            }
            return Some((content.to_string(), self.line));
        }
    }

    /// Next top-level event. Blank and comment lines are skipped.
    pub fn next_event(&mut self) -> Option<LexEvent> {
        let (content, line) = self.peek_content()?;
        self.advance();

        let location = self.location(line);
        match header_name(&content) {
            Some(name) => Some(LexEvent::Header {
                name: name.to_string(),
                location,
            }),
            None => Some(LexEvent::Text {
                text: content.trim().to_string(),
                location,
            }),
        }
    }

    /// Read one record. Returns `Keyword` without consuming anything when a
    /// recognized header appears before the record starts.
    fn read_record(&mut self, raw: bool, is_keyword: &dyn Fn(&str) -> bool) -> RecordRead {
        let mut tokens: Vec<RawToken> = Vec::new();
        let mut start: Option<u32> = None;

        loop {
            let Some((content, line)) = self.peek_content() else {
                return RecordRead::EndOfInput;
            };

            if start.is_none() {
                if let Some(name) = header_name(&content) {
                    if is_keyword(name) {
                        return RecordRead::Keyword;
                    }
                }
            }

            let (segment, terminated) = split_terminator(&content, raw);
            tokens.extend(tokenize(segment, line));
            let first = *start.get_or_insert(line);
            self.advance();

            if terminated {
                return RecordRead::Record(RawRecord::new(tokens, self.location(first)));
            }
        }
    }

    /// Read the records of `keyword` in the given shape.
    ///
    /// `raw` selects the last slash on a line as the terminator.
    /// `is_keyword` tells which names end a keyword early.
    pub fn read_records(
        &mut self,
        keyword: &mut RawKeyword,
        shape: &RecordShape,
        raw: bool,
        is_keyword: &dyn Fn(&str) -> bool,
    ) {
        keyword.termination = match shape {
            RecordShape::None => Termination::Complete,
            RecordShape::Fixed(n) => self.read_fixed(keyword, *n, raw, is_keyword),
            RecordShape::Terminated => self.read_terminated(keyword, raw, is_keyword, false),
            RecordShape::UntilKeyword => self.read_terminated(keyword, raw, is_keyword, true),
            RecordShape::Tables(count) => self.read_tables(keyword, *count, raw, is_keyword),
            RecordShape::Code(end) => self.read_code(keyword, end),
            RecordShape::Line => self.read_line(keyword),
        };
    }

    fn read_fixed(
        &mut self,
        keyword: &mut RawKeyword,
        count: usize,
        raw: bool,
        is_keyword: &dyn Fn(&str) -> bool,
    ) -> Termination {
        while keyword.records.len() < count {
            match self.read_record(raw, is_keyword) {
                RecordRead::Record(record) => keyword.records.push(record),
                RecordRead::Keyword => return Termination::NextKeyword,
                RecordRead::EndOfInput => return Termination::EndOfInput,
            }
        }
        Termination::Complete
    }

    fn read_terminated(
        &mut self,
        keyword: &mut RawKeyword,
        raw: bool,
        is_keyword: &dyn Fn(&str) -> bool,
        until_keyword: bool,
    ) -> Termination {
        loop {
            match self.read_record(raw, is_keyword) {
                RecordRead::Record(record) if record.is_empty() => return Termination::Complete,
                RecordRead::Record(record) => keyword.records.push(record),
                RecordRead::Keyword if until_keyword => return Termination::Complete,
                RecordRead::EndOfInput if until_keyword => return Termination::Complete,
                RecordRead::Keyword => return Termination::NextKeyword,
                RecordRead::EndOfInput => return Termination::EndOfInput,
            }
        }
    }

    fn read_tables(
        &mut self,
        keyword: &mut RawKeyword,
        count: Option<usize>,
        raw: bool,
        is_keyword: &dyn Fn(&str) -> bool,
    ) -> Termination {
        if count == Some(0) {
            return Termination::Complete;
        }

        let mut previous_empty = false;
        loop {
            match self.read_record(raw, is_keyword) {
                RecordRead::Record(record) if record.is_empty() => {
                    if count.is_none() && previous_empty {
                        return Termination::Complete;
                    }
                    keyword.table_ends.push(keyword.records.len());
                    if Some(keyword.table_ends.len()) == count {
                        return Termination::Complete;
                    }
                    previous_empty = true;
                }
                RecordRead::Record(record) => {
                    keyword.records.push(record);
                    previous_empty = false;
                }
                RecordRead::Keyword => return Termination::NextKeyword,
                RecordRead::EndOfInput => return Termination::EndOfInput,
            }
        }
    }

    fn read_code(&mut self, keyword: &mut RawKeyword, end: &str) -> Termination {
        let mut lines: Vec<String> = Vec::new();
        let start = self.line;

        while let Some(line) = self.peek_line() {
            if line.trim() == end {
                self.advance();
                let text = lines.join("\n");
                keyword
                    .records
                    .push(RawRecord::new(vec![RawToken::new(text, start)], self.location(start)));
                return Termination::Complete;
            }
            lines.push(line.to_string());
            self.advance();
        }
        Termination::EndOfInput
    }

    fn read_line(&mut self, keyword: &mut RawKeyword) -> Termination {
        loop {
            let Some(line) = self.peek_line() else {
                return Termination::EndOfInput;
            };
            let text = line.trim().to_string();
            let number = self.line;
            self.advance();
            if !text.is_empty() {
                keyword.records.push(RawRecord::new(
                    vec![RawToken::new(text, number)],
                    self.location(number),
                ));
                return Termination::Complete;
            }
        }
    }
}
