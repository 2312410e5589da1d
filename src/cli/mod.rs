pub mod check;
pub mod completions;
pub mod keywords;
pub mod parse;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::ParserConfig;
use crate::deck::Section;
use crate::error::Result;

/// ecldeck - Schema-driven reader for reservoir simulation decks
#[derive(Parser, Debug)]
#[command(name = "ecldeck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ./ecldeck.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a deck and print diagnostics
    Parse(parse::ParseArgs),

    /// Parse a deck and validate its structure
    Check(check::CheckArgs),

    /// List the keywords the registry knows
    Keywords(keywords::KeywordsArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Parser options shared by the commands that read decks.
#[derive(Args, Debug, Default)]
pub struct ParserArgs {
    /// Extra keyword descriptor directories
    #[arg(long = "schemas", value_name = "DIR")]
    pub schemas: Vec<PathBuf>,

    /// Error policy override, e.g. unknown-keyword=throw
    #[arg(long = "policy", value_name = "KIND=ACTION")]
    pub policy: Vec<String>,

    /// Only read these sections (RUNSPEC is always read)
    #[arg(long, value_delimiter = ',', value_name = "SECTION")]
    pub sections: Vec<Section>,

    /// Skip the compiled-in keyword set
    #[arg(long)]
    pub no_builtins: bool,
}

impl ParserArgs {
    /// Layer these flags over the configuration file.
    pub fn resolve(&self, config: Option<&std::path::Path>) -> Result<ParserConfig> {
        let mut resolved = ParserConfig::discover(config)?;
        resolved.schemas.extend(self.schemas.iter().cloned());
        resolved.apply_overrides(&self.policy)?;
        if !self.sections.is_empty() {
            resolved.sections = self.sections.clone();
        }
        if self.no_builtins {
            resolved.builtins = false;
        }
        Ok(resolved)
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ecldeck={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
