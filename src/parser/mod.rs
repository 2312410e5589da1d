//! Deck parsing.
//!
//! A [`Parser`] borrows a [`Registry`] and turns deck text into a
//! [`Deck`]. Parsing is strictly sequential: each keyword is lexed, sized,
//! typed and appended before the next one is read, because record counts
//! may depend on keywords seen earlier.
//!
//! # Usage
//!
//! ```no_run
//! use ecldeck::context::ParseContext;
//! use ecldeck::parser::Parser;
//! use ecldeck::registry::Registry;
//!
//! let registry = Registry::builtin()?;
//! let parsed = Parser::new(&registry).parse_file("CASE.DATA", &ParseContext::new())?;
//!
//! for warning in parsed.diagnostics.iter() {
//!     eprintln!("{}", warning);
//! }
//! println!("{} keywords", parsed.deck.len());
//! # Ok::<(), ecldeck::error::DeckError>(())
//! ```

mod input;
mod lexer;
mod location;
mod raw;
mod size;
mod state;
mod token;
mod typing;

pub use location::{Location, MEMORY_SOURCE};

use std::path::{Path, PathBuf};

use crate::context::{Diagnostics, ParseContext};
use crate::deck::{Deck, Section};
use crate::error::Result;
use crate::registry::Registry;
use input::InputStack;
use state::ParseState;

/// Where the deck text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A data file. Includes resolve against its directory.
    File(PathBuf),
    /// Deck text held in memory. Includes resolve against the parser's
    /// include directory.
    Text(String),
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::File(path.to_path_buf())
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::File(path)
    }
}

/// A finished parse: the deck and every recorded warning.
#[derive(Debug)]
pub struct Parsed {
    pub deck: Deck,
    pub diagnostics: Diagnostics,
}

/// Parses decks against a borrowed registry.
///
/// The registry cannot be changed while a parser holds it, so any number
/// of parsers on different threads may share one.
#[derive(Debug, Clone)]
pub struct Parser<'r> {
    registry: &'r Registry,
    include_dir: PathBuf,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            include_dir: PathBuf::from("."),
        }
    }

    /// Directory includes in in-memory text resolve against.
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dir = dir.into();
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Parse a whole deck.
    pub fn parse(&self, input: Input, ctx: &ParseContext) -> Result<Parsed> {
        self.run(input, None, ctx)
    }

    /// Parse only the given sections.
    ///
    /// RUNSPEC is always read since later sections are sized from it.
    /// Unrequested sections are skipped up to the next section header, and
    /// an unrequested SCHEDULE ends the parse. INCLUDE, PATHS and ENDINC are
    /// still followed inside skipped sections, so a section header found in
    /// an included file is honoured.
    pub fn parse_partial(
        &self,
        input: Input,
        sections: &[Section],
        ctx: &ParseContext,
    ) -> Result<Parsed> {
        self.run(input, Some(sections), ctx)
    }

    pub fn parse_file(&self, path: impl AsRef<Path>, ctx: &ParseContext) -> Result<Parsed> {
        self.parse(Input::File(path.as_ref().to_path_buf()), ctx)
    }

    pub fn parse_string(&self, text: &str, ctx: &ParseContext) -> Result<Parsed> {
        self.parse(Input::Text(text.to_string()), ctx)
    }

    fn run(&self, input: Input, sections: Option<&[Section]>, ctx: &ParseContext) -> Result<Parsed> {
        match input {
            Input::File(path) => {
                tracing::info!(path = %path.display(), "parsing deck");
                let stack = InputStack::from_file(&path)?;
                let mut state = ParseState::new(self.registry, ctx, sections, stack);
                state.set_data_file(&path);
                state.run()
            }
            Input::Text(text) => {
                let stack = InputStack::from_text(MEMORY_SOURCE, &text, &self.include_dir);
                ParseState::new(self.registry, ctx, sections, stack).run()
            }
        }
    }
}
