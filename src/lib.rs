//! ecldeck - Schema-driven reader for reservoir simulation decks
//!
//! A library for reading keyword-oriented simulator input decks. Keyword
//! layouts come from a registry of schemas, so the parser itself knows
//! nothing about individual keywords beyond a handful of directives.

pub mod cli;
pub mod config;
pub mod context;
pub mod deck;
pub mod error;
pub mod output;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod units;
pub mod validation;

pub use config::ParserConfig;
pub use context::{Action, Diagnostic, Diagnostics, ErrorKind, ParseContext, Severity};
pub use deck::{Deck, DeckItem, DeckKeyword, DeckRecord, Section, UdaValue, Value};
pub use error::{DeckError, Result};
pub use parser::{Input, Location, Parsed, Parser};
pub use registry::Registry;
pub use schema::{ItemKind, ItemSchema, ItemSize, KeywordSchema, RecordSchema, SizeRef, SizeRule};
pub use units::{Dimension, UnitSystem, UnitSystemKind};
pub use validation::validate_deck;
