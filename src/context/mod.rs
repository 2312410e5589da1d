//! Per-kind error policy for a parse.
//!
//! Every recoverable problem the parser meets has an [`ErrorKind`]. A
//! [`ParseContext`] maps each kind to an [`Action`]: abort the parse, record
//! a warning and recover, or recover silently. Fatal kinds abort regardless
//! of the configured action.

mod diagnostic;

pub use diagnostic::{Diagnostic, Diagnostics, Severity};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeckError, Result};
use crate::parser::Location;

/// Category of a parse problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// A keyword name with no registered schema.
    UnknownKeyword,
    /// Data found where a keyword was expected.
    UnrecognizedContent,
    /// A token that does not fit its item, or surplus tokens in a record.
    MalformedRecord,
    /// Record ended before an item without default got a value.
    MissingRequiredValue,
    /// A keyword-dependent size whose reference has not been seen.
    UnresolvedSize,
    /// Too few or too many records for a keyword.
    RecordCount,
    /// Keyword outside its sections, or sections out of order.
    SectionViolation,
    /// INCLUDE of a file that does not exist.
    MissingInclude,
    /// Keyword name longer than eight characters.
    LongKeyword,
    /// A keyword whose required or prohibited companions are violated.
    KeywordCombination,
    /// A file that includes itself, directly or transitively.
    InclusionCycle,
    /// A schema descriptor that cannot be loaded.
    SchemaLoad,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 12] = [
        ErrorKind::UnknownKeyword,
        ErrorKind::UnrecognizedContent,
        ErrorKind::MalformedRecord,
        ErrorKind::MissingRequiredValue,
        ErrorKind::UnresolvedSize,
        ErrorKind::RecordCount,
        ErrorKind::SectionViolation,
        ErrorKind::MissingInclude,
        ErrorKind::LongKeyword,
        ErrorKind::KeywordCombination,
        ErrorKind::InclusionCycle,
        ErrorKind::SchemaLoad,
    ];

    /// Kinds that abort a parse whatever the policy says.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::InclusionCycle | ErrorKind::SchemaLoad)
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UnknownKeyword => "unknown-keyword",
            ErrorKind::UnrecognizedContent => "unrecognized-content",
            ErrorKind::MalformedRecord => "malformed-record",
            ErrorKind::MissingRequiredValue => "missing-required-value",
            ErrorKind::UnresolvedSize => "unresolved-size",
            ErrorKind::RecordCount => "record-count",
            ErrorKind::SectionViolation => "section-violation",
            ErrorKind::MissingInclude => "missing-include",
            ErrorKind::LongKeyword => "long-keyword",
            ErrorKind::KeywordCombination => "keyword-combination",
            ErrorKind::InclusionCycle => "inclusion-cycle",
            ErrorKind::SchemaLoad => "schema-load",
        }
    }

    /// Action used when a context has no explicit entry for this kind.
    pub fn default_action(self) -> Action {
        match self {
            ErrorKind::UnknownKeyword
            | ErrorKind::MissingRequiredValue
            | ErrorKind::SectionViolation
            | ErrorKind::LongKeyword => Action::Warn,
            _ => Action::Throw,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ErrorKind {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == s)
            .ok_or_else(|| DeckError::Config {
                message: format!("unknown error kind '{}'", s),
                help: Some(format!(
                    "Expected one of: {}",
                    Self::ALL
                        .iter()
                        .map(|k| k.code())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
            })
    }
}

/// What to do when a problem of a given kind is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Abort the parse with every diagnostic collected so far.
    Throw,
    /// Record a warning and continue with the recovery value.
    Warn,
    /// Continue with the recovery value, record nothing.
    Ignore,
}

impl FromStr for Action {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "throw" => Ok(Action::Throw),
            "warn" => Ok(Action::Warn),
            "ignore" => Ok(Action::Ignore),
            other => Err(DeckError::Config {
                message: format!("unknown action '{}'", other),
                help: Some("Expected one of: throw, warn, ignore".to_string()),
            }),
        }
    }
}

/// Error policy for one parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseContext {
    actions: HashMap<ErrorKind, Action>,
}

impl ParseContext {
    /// Context using the default action for every kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recoverable kind aborts the parse.
    pub fn strict() -> Self {
        Self::uniform(Action::Throw)
    }

    /// Every recoverable kind is recorded as a warning.
    pub fn lenient() -> Self {
        Self::uniform(Action::Warn)
    }

    fn uniform(action: Action) -> Self {
        let actions = ErrorKind::ALL
            .iter()
            .filter(|kind| !kind.is_fatal())
            .map(|kind| (*kind, action))
            .collect();
        Self { actions }
    }

    /// Override the action for one kind.
    pub fn with(mut self, kind: ErrorKind, action: Action) -> Self {
        self.set(kind, action);
        self
    }

    pub fn set(&mut self, kind: ErrorKind, action: Action) {
        self.actions.insert(kind, action);
    }

    /// Effective action for a kind. Fatal kinds always throw.
    pub fn action(&self, kind: ErrorKind) -> Action {
        if kind.is_fatal() {
            return Action::Throw;
        }
        self.actions
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_action())
    }

    /// Apply the policy to a problem.
    ///
    /// Returns `Err` when the parse must stop. The error carries every
    /// diagnostic in `diagnostics` followed by the triggering one. On `Ok`
    /// the caller applies its recovery value.
    pub fn handle(
        &self,
        kind: ErrorKind,
        message: impl Into<String>,
        location: Option<&Location>,
        keyword: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let message = message.into();
        match self.action(kind) {
            Action::Throw => {
                let trigger = Diagnostic::error(kind, message.clone())
                    .at(location)
                    .in_keyword(keyword);
                let summary = trigger.to_string();
                let mut all = std::mem::take(diagnostics);
                all.push(trigger);
                Err(DeckError::Parse {
                    message: summary,
                    diagnostics: all.into_vec(),
                })
            }
            Action::Warn => {
                let diagnostic = Diagnostic::warning(kind, message)
                    .at(location)
                    .in_keyword(keyword);
                tracing::warn!("{}", diagnostic);
                diagnostics.push(diagnostic);
                Ok(())
            }
            Action::Ignore => {
                tracing::trace!(kind = kind.code(), "ignored: {}", message);
                Ok(())
            }
        }
    }
}
