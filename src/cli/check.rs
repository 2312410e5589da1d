//! Check command implementation.
//!
//! Parses a deck, then runs the structural validation over it.

use std::path::{Path, PathBuf};

use clap::Args;

use super::parse::load_deck;
use super::ParserArgs;
use crate::error::{DeckError, Result};
use crate::output::{display_path, plural, Printer};
use crate::validation::validate_deck;

/// Parse a deck and validate its structure
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Data file to check
    pub file: PathBuf,

    #[command(flatten)]
    pub parser: ParserArgs,

    /// Treat validation warnings as errors
    #[arg(long)]
    pub deny_warnings: bool,
}

pub fn run(args: CheckArgs, config: Option<&Path>, printer: &Printer) -> Result<()> {
    let (registry, parsed) = load_deck(&args.file, &args.parser, config, printer)?;

    let result = validate_deck(&parsed.deck, &registry);
    printer.diagnostics(&result);

    let errors = result.error_count();
    let warnings = result.warning_count();
    let failed = errors > 0 || (args.deny_warnings && warnings > 0);
    let summary = format!(
        "{}, {}",
        plural(errors, "error", "errors"),
        plural(warnings, "warning", "warnings")
    );

    if failed {
        printer.error("Invalid", &format!("{} ({})", display_path(&args.file), summary));
        return Err(DeckError::Parse {
            message: format!("{} failed validation", display_path(&args.file)),
            diagnostics: result.into_vec(),
        });
    }

    printer.status("Valid", &format!("{} ({})", display_path(&args.file), summary));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn check(text: &str, deny_warnings: bool) -> Result<()> {
        let dir = tempdir().unwrap();
        let file = dir.path().join("CASE.DATA");
        std::fs::write(&file, text).unwrap();
        let config = dir.path().join("ecldeck.yaml");
        std::fs::write(&config, "builtins: true\n").unwrap();

        let args = CheckArgs {
            file,
            parser: ParserArgs::default(),
            deny_warnings,
        };
        run(args, Some(&config), &Printer::new())
    }

    #[test]
    fn test_check_complete_deck() {
        let text = "RUNSPEC\nDIMENS\n 1 1 1 /\nGRID\nPROPS\nSOLUTION\nSCHEDULE\n";
        assert!(check(text, true).is_ok());
    }

    #[test]
    fn test_check_missing_sections() {
        let text = "RUNSPEC\nDIMENS\n 1 1 1 /\n";
        assert!(check(text, false).is_ok());

        let err = check(text, true).unwrap_err();
        assert_eq!(err.diagnostics().len(), 4);
    }
}
