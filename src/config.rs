//! Parser configuration (ecldeck.yaml).
//!
//! The configuration names extra schema directories, the sections to read
//! and the error policy. Command line flags override it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::{Action, ErrorKind, ParseContext};
use crate::deck::Section;
use crate::error::{DeckError, Result};
use crate::registry::{load_directory, Registry};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "ecldeck.yaml";

/// Configuration loaded from ecldeck.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Directories of keyword descriptors, loaded in order after the
    /// builtins. Later definitions replace earlier ones.
    pub schemas: Vec<PathBuf>,

    /// Start from the compiled-in keyword set.
    #[serde(default = "default_builtins")]
    pub builtins: bool,

    /// Sections to read. Empty reads the whole deck.
    pub sections: Vec<Section>,

    /// Action per error kind, e.g. `unknown-keyword: throw`.
    pub policy: HashMap<ErrorKind, Action>,
}

fn default_builtins() -> bool {
    true
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            schemas: vec![],
            builtins: default_builtins(),
            sections: vec![],
            policy: HashMap::new(),
        }
    }
}

impl ParserConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DeckError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        let mut config = Self::parse(&content)?;
        // Schema directories are relative to the config file.
        if let Some(base) = path.parent() {
            for dir in &mut config.schemas {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| DeckError::Config {
            message: format!("Invalid config: {}", e),
            help: Some(format!("Check {} syntax", CONFIG_FILE)),
        })
    }

    /// `ecldeck.yaml` in `dir`, when present.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    }

    /// Load `path` if given, else `ecldeck.yaml` from the current
    /// directory, else the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::find(Path::new(".")) {
                Some(found) => {
                    tracing::debug!(path = %found.display(), "using config");
                    Self::load(&found)
                }
                None => Ok(Self::default()),
            },
        }
    }

    /// Apply `kind=action` overrides.
    pub fn apply_overrides(&mut self, overrides: &[String]) -> Result<()> {
        for text in overrides {
            let (kind, action) = parse_override(text)?;
            self.policy.insert(kind, action);
        }
        Ok(())
    }

    /// Error policy described by this configuration.
    pub fn to_context(&self) -> ParseContext {
        self.policy
            .iter()
            .fold(ParseContext::new(), |ctx, (kind, action)| {
                ctx.with(*kind, *action)
            })
    }

    /// Registry with the builtins (if enabled) and every schema directory.
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = if self.builtins {
            Registry::builtin()?
        } else {
            Registry::new()
        };
        for dir in &self.schemas {
            load_directory(dir, &mut registry)?;
        }
        Ok(registry)
    }
}

/// Parse one `kind=action` override.
pub fn parse_override(text: &str) -> Result<(ErrorKind, Action)> {
    let Some((kind, action)) = text.split_once('=') else {
        return Err(DeckError::Config {
            message: format!("invalid policy '{}'", text),
            help: Some("Use KIND=ACTION, e.g. unknown-keyword=throw".to_string()),
        });
    };
    Ok((kind.trim().parse()?, action.trim().parse()?))
}
