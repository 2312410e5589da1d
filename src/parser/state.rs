//! The parse driver.
//!
//! Pulls top-level events from the innermost open input, matches keyword
//! headers against the registry, reads and types their records, and hands
//! the result to the deck assembler. Input control keywords (INCLUDE,
//! PATHS, ENDINC, END) act on the input stack and are not kept in the deck.

use std::path::Path;

use super::input::{IncludeError, InputStack};
use super::lexer::{LexEvent, RecordShape};
use super::location::Location;
use super::raw::{RawKeyword, Termination};
use super::size;
use super::typing::{self, RecordTyper};
use super::Parsed;
use crate::context::{Diagnostics, ErrorKind, ParseContext};
use crate::deck::{DeckAssembler, DeckKeyword, Section, Transition, Value};
use crate::error::Result;
use crate::registry::Registry;
use crate::schema::{KeywordSchema, MAX_KEYWORD_LENGTH};

const INCLUDE: &str = "INCLUDE";
const PATHS: &str = "PATHS";
const END: &str = "END";
const ENDINC: &str = "ENDINC";

/// What top-level input is being passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    None,
    /// Data of an unknown or unreadable keyword. Ends at a recognized header.
    Keyword,
    /// An unrequested section. Ends at the next section header.
    Section,
}

/// Recognized as is, or by its first eight characters.
fn recognized(registry: &Registry, name: &str) -> bool {
    registry.is_recognized(name)
        || (name.len() > MAX_KEYWORD_LENGTH
            && name
                .get(..MAX_KEYWORD_LENGTH)
                .is_some_and(|short| registry.is_recognized(short)))
}

/// Keywords that act on the input stack rather than the deck.
fn is_input_control(name: &str) -> bool {
    matches!(name, INCLUDE | PATHS | ENDINC | END)
}

fn first_str(keyword: &DeckKeyword, record: usize, item: usize) -> Option<&str> {
    keyword
        .record(record)
        .and_then(|r| r.get(item))
        .and_then(|i| i.value(0))
        .and_then(Value::as_str)
}

pub(crate) struct ParseState<'a> {
    registry: &'a Registry,
    ctx: &'a ParseContext,
    /// Requested sections for a partial parse.
    sections: Option<&'a [Section]>,
    input: InputStack,
    assembler: DeckAssembler,
    diagnostics: Diagnostics,
    skip: Skip,
    /// Last keyword whose record count was known in advance. Data lines
    /// after it are surplus records.
    last_bounded: Option<String>,
    stopped: bool,
}

impl<'a> ParseState<'a> {
    pub fn new(
        registry: &'a Registry,
        ctx: &'a ParseContext,
        sections: Option<&'a [Section]>,
        input: InputStack,
    ) -> Self {
        Self {
            registry,
            ctx,
            sections,
            input,
            assembler: DeckAssembler::new(),
            diagnostics: Diagnostics::new(),
            skip: Skip::None,
            last_bounded: None,
            stopped: false,
        }
    }

    pub fn set_data_file(&mut self, path: &Path) {
        self.assembler.set_data_file(path);
    }

    /// Read every input to the end, or up to END.
    pub fn run(mut self) -> Result<Parsed> {
        while !self.stopped {
            let event = match self.input.current() {
                Some(lexer) => lexer.next_event(),
                None => break,
            };
            match event {
                Some(LexEvent::Header { name, location }) => self.on_header(name, location)?,
                Some(LexEvent::Text { text, location }) => self.on_text(text, location)?,
                None if self.input.depth() > 1 => self.close_include(),
                None => break,
            }
        }

        let deck = self.assembler.finish();
        tracing::info!(
            keywords = deck.len(),
            warnings = self.diagnostics.warning_count(),
            "parsed deck"
        );
        Ok(Parsed {
            deck,
            diagnostics: self.diagnostics,
        })
    }

    fn report(
        &mut self,
        kind: ErrorKind,
        message: String,
        location: &Location,
        keyword: Option<&str>,
    ) -> Result<()> {
        self.ctx
            .handle(kind, message, Some(location), keyword, &mut self.diagnostics)
    }

    fn close_include(&mut self) {
        self.input.pop();
        self.last_bounded = None;
        if self.skip == Skip::Keyword {
            self.skip = Skip::None;
        }
    }

    fn on_header(&mut self, name: String, location: Location) -> Result<()> {
        let registry = self.registry;
        let control = is_input_control(&name);
        match self.skip {
            Skip::Section if !Section::is_header(&name) && !control => return Ok(()),
            Skip::Keyword if !recognized(registry, &name) => return Ok(()),
            _ => {}
        }
        // Input control inside a skipped section still runs, so that section
        // headers in included files are seen.
        let resume_section_skip = self.skip == Skip::Section && control;
        self.skip = Skip::None;
        self.last_bounded = None;

        let result = self.read_header(name, location);
        if resume_section_skip && self.skip == Skip::None {
            self.skip = Skip::Section;
        }
        result
    }

    fn read_header(&mut self, name: String, location: Location) -> Result<()> {
        let Some((schema, name)) = self.match_keyword(name, &location)? else {
            return Ok(());
        };

        if let Some(section) = Section::from_name(&name) {
            if !self.enter_section(section, &name, &location)? {
                return Ok(());
            }
        }
        self.read_keyword(schema, name, location)
    }

    /// Schema for a header, with the name it is known by.
    fn match_keyword(
        &mut self,
        name: String,
        location: &Location,
    ) -> Result<Option<(&'a KeywordSchema, String)>> {
        let registry = self.registry;
        if let Some(schema) = registry.find(&name) {
            return Ok(Some((schema, name)));
        }

        if name.len() > MAX_KEYWORD_LENGTH {
            if let Some(short) = name.get(..MAX_KEYWORD_LENGTH) {
                if let Some(schema) = registry.find(short) {
                    let short = short.to_string();
                    self.report(
                        ErrorKind::LongKeyword,
                        format!(
                            "keyword {} is longer than {} characters, read as {}",
                            name, MAX_KEYWORD_LENGTH, short
                        ),
                        location,
                        Some(short.as_str()),
                    )?;
                    return Ok(Some((schema, short)));
                }
            }
        }

        self.report(
            ErrorKind::UnknownKeyword,
            format!("unknown keyword {}", name),
            location,
            Some(name.as_str()),
        )?;
        self.skip = Skip::Keyword;
        Ok(None)
    }

    /// Apply a section header. Returns false when the section is skipped.
    fn enter_section(&mut self, section: Section, name: &str, location: &Location) -> Result<bool> {
        if let Some(wanted) = self.sections {
            if section != Section::Runspec && !wanted.contains(&section) {
                if section == Section::Schedule {
                    tracing::debug!("SCHEDULE not requested, stopping");
                    self.stopped = true;
                } else {
                    tracing::debug!(%section, "skipping section");
                    self.assembler.enter_section(section);
                    self.skip = Skip::Section;
                }
                return Ok(false);
            }
        }

        let current = self.assembler.current_section();
        if self.assembler.enter_section(section) == Transition::Backward {
            self.report(
                ErrorKind::SectionViolation,
                format!("{} header after the {} section", section, current),
                location,
                Some(name),
            )?;
        }
        Ok(true)
    }

    fn read_keyword(
        &mut self,
        schema: &'a KeywordSchema,
        name: String,
        location: Location,
    ) -> Result<()> {
        if let Some(message) = self.assembler.check_combination(schema) {
            self.report(ErrorKind::KeywordCombination, message, &location, Some(name.as_str()))?;
        }

        let shape = match size::resolve(schema, self.assembler.deck()) {
            Ok(shape) => shape,
            Err(message) => {
                self.report(ErrorKind::UnresolvedSize, message, &location, Some(name.as_str()))?;
                let keyword = DeckKeyword::new(
                    name.clone(),
                    location.clone(),
                    self.assembler.current_section(),
                );
                self.append(schema, keyword, &location)?;
                self.skip = Skip::Keyword;
                return Ok(());
            }
        };

        let mut raw = RawKeyword::new(name.clone(), location.clone());
        let registry = self.registry;
        let is_keyword = |candidate: &str| recognized(registry, candidate);
        if let Some(lexer) = self.input.current() {
            lexer.read_records(&mut raw, &shape, schema.is_raw_string(), &is_keyword);
        }
        self.check_cardinality(schema, &raw, &shape)?;

        let section = self.assembler.current_section();
        let limit = typing::element_limit(self.assembler.deck());
        let keyword = RecordTyper::new(self.ctx, &name, &mut self.diagnostics)
            .with_element_limit(limit)
            .type_keyword(&raw, schema, section)?;
        tracing::debug!(keyword = %name, records = keyword.len(), %location, "read keyword");

        match schema.name.as_str() {
            INCLUDE => return self.include(&keyword, &location),
            PATHS => {
                for record in 0..keyword.len() {
                    if let (Some(alias), Some(value)) =
                        (first_str(&keyword, record, 0), first_str(&keyword, record, 1))
                    {
                        tracing::debug!(alias, value, "path alias");
                        self.input.add_alias(alias, value);
                    }
                }
                return Ok(());
            }
            END => {
                self.stopped = true;
                return Ok(());
            }
            ENDINC => {
                if self.input.depth() > 1 {
                    self.close_include();
                }
                return Ok(());
            }
            _ => {}
        }

        self.append(schema, keyword, &location)?;
        if size::is_bounded(&shape) {
            self.last_bounded = Some(name);
        }
        Ok(())
    }

    fn check_cardinality(
        &mut self,
        schema: &KeywordSchema,
        raw: &RawKeyword,
        shape: &RecordShape,
    ) -> Result<()> {
        let found = raw.records.len();
        if raw.termination != Termination::Complete {
            let expected = match shape {
                RecordShape::Fixed(n) => format!("expected {} records, found {}", n, found),
                RecordShape::Tables(Some(n)) => {
                    format!("expected {} tables, found {}", n, raw.table_ends.len())
                }
                RecordShape::Code(end) => format!("missing end marker {}", end),
                RecordShape::Line => "missing title line".to_string(),
                _ => "missing terminating slash".to_string(),
            };
            let cause = match raw.termination {
                Termination::NextKeyword => "before the next keyword",
                _ => "before end of input",
            };
            self.report(
                ErrorKind::RecordCount,
                format!("{} {}", expected, cause),
                &raw.location,
                Some(raw.name.as_str()),
            )?;
        }

        if let (RecordShape::UntilKeyword, Some(min)) = (shape, schema.min_size) {
            if found < min {
                self.report(
                    ErrorKind::RecordCount,
                    format!("expected at least {} records, found {}", min, found),
                    &raw.location,
                    Some(raw.name.as_str()),
                )?;
            }
        }
        Ok(())
    }

    fn append(
        &mut self,
        schema: &KeywordSchema,
        keyword: DeckKeyword,
        location: &Location,
    ) -> Result<()> {
        if let Some(message) = self.assembler.check_section(schema) {
            let name = keyword.name().to_string();
            self.report(ErrorKind::SectionViolation, message, location, Some(name.as_str()))?;
        }
        self.assembler.append(keyword);
        Ok(())
    }

    fn include(&mut self, keyword: &DeckKeyword, location: &Location) -> Result<()> {
        let Some(argument) = first_str(keyword, 0, 0) else {
            return self.report(
                ErrorKind::MalformedRecord,
                "INCLUDE without a file name".to_string(),
                location,
                Some(INCLUDE),
            );
        };

        let path = match self.input.resolve(argument) {
            Ok(path) => path,
            Err(alias) => {
                return self.report(
                    ErrorKind::MissingInclude,
                    format!("unknown path alias ${} in '{}'", alias, argument),
                    location,
                    Some(INCLUDE),
                );
            }
        };

        match self.input.push_file(&path) {
            Ok(()) => {
                self.last_bounded = None;
                Ok(())
            }
            Err(IncludeError::Missing(missing)) => self.report(
                ErrorKind::MissingInclude,
                format!("included file {} not found", missing.display()),
                location,
                Some(INCLUDE),
            ),
            Err(IncludeError::Cycle(chain)) => {
                let chain: Vec<String> = chain.iter().map(|p| p.display().to_string()).collect();
                self.report(
                    ErrorKind::InclusionCycle,
                    format!("inclusion cycle: {}", chain.join(" -> ")),
                    location,
                    Some(INCLUDE),
                )
            }
        }
    }

    /// A data line where a keyword header was expected.
    fn on_text(&mut self, text: String, location: Location) -> Result<()> {
        if self.skip != Skip::None {
            return Ok(());
        }

        let keyword = self.last_bounded.take();
        let (kind, message) = if text == "/" {
            (
                ErrorKind::UnrecognizedContent,
                "stray terminator '/'".to_string(),
            )
        } else if let Some(name) = &keyword {
            (
                ErrorKind::RecordCount,
                format!("too many records for {}: '{}'", name, text),
            )
        } else {
            (
                ErrorKind::UnrecognizedContent,
                format!("unrecognized content '{}'", text),
            )
        };

        self.report(kind, message, &location, keyword.as_deref())?;
        self.skip = Skip::Keyword;
        Ok(())
    }
}
