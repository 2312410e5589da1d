//! Parse command implementation.
//!
//! Reads one deck, reports diagnostics on stderr and optionally writes the
//! parsed deck to stdout as deck text or JSON.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;

use super::ParserArgs;
use crate::error::{DeckError, Result};
use crate::output::{display_path, plural, Printer};
use crate::parser::{Input, Parsed, Parser};
use crate::registry::Registry;

/// Parse a deck and print diagnostics
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Data file to parse
    pub file: PathBuf,

    #[command(flatten)]
    pub parser: ParserArgs,

    /// Write the parsed deck back out as deck text
    #[arg(long, conflicts_with = "json")]
    pub dump: bool,

    /// Write the parsed deck as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ParseArgs, config: Option<&Path>, printer: &Printer) -> Result<()> {
    let (_, parsed) = load_deck(&args.file, &args.parser, config, printer)?;

    let mut stdout = io::stdout().lock();
    if args.dump {
        write!(stdout, "{}", parsed.deck)?;
    } else if args.json {
        serde_json::to_writer_pretty(&mut stdout, &parsed.deck).map_err(io::Error::from)?;
        writeln!(stdout)?;
    }

    Ok(())
}

/// Resolve configuration, build the registry and parse `file`.
///
/// Diagnostics are printed whether the parse succeeds or aborts.
pub(crate) fn load_deck(
    file: &Path,
    args: &ParserArgs,
    config: Option<&Path>,
    printer: &Printer,
) -> Result<(Registry, Parsed)> {
    let config = args.resolve(config)?;
    let registry = config.registry()?;
    let ctx = config.to_context();

    printer.status("Parsing", &display_path(file));

    let parser = Parser::new(&registry);
    let input = Input::File(file.to_path_buf());
    let result = if config.sections.is_empty() {
        parser.parse(input, &ctx)
    } else {
        parser.parse_partial(input, &config.sections, &ctx)
    };

    let parsed = match result {
        Ok(parsed) => parsed,
        Err(e @ DeckError::Parse { .. }) => {
            for diagnostic in e.diagnostics() {
                printer.diagnostic(diagnostic);
            }
            printer.error("Aborted", &display_path(file));
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    printer.diagnostics(&parsed.diagnostics);
    printer.status(
        "Finished",
        &format!(
            "{}, {}",
            plural(parsed.deck.len(), "keyword", "keywords"),
            plural(parsed.diagnostics.len(), "warning", "warnings")
        ),
    );

    Ok((registry, parsed))
}
