use miette::Diagnostic;
use thiserror::Error;

use crate::context::Diagnostic as DeckDiagnostic;

/// Main error type for ecldeck operations
#[derive(Error, Diagnostic, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    #[diagnostic(code(ecldeck::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(ecldeck::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Schema error: {message}")]
    #[diagnostic(code(ecldeck::schema))]
    Schema {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Parse aborted: {message}")]
    #[diagnostic(code(ecldeck::parse))]
    Parse {
        message: String,
        /// Every diagnostic recorded before the abort, trigger included.
        diagnostics: Vec<DeckDiagnostic>,
    },

    #[error("Config error: {message}")]
    #[diagnostic(code(ecldeck::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Value error: {message}")]
    #[diagnostic(code(ecldeck::value))]
    Value { message: String },
}

impl DeckError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        DeckError::Schema {
            message: message.into(),
            help: None,
        }
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        DeckError::Value {
            message: message.into(),
        }
    }

    /// Diagnostics carried by an aborted parse (empty for other variants).
    pub fn diagnostics(&self) -> &[DeckDiagnostic] {
        match self {
            DeckError::Parse { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
