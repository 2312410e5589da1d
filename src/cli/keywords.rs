//! Keywords command implementation.
//!
//! Loads the registry and prints its keywords grouped by section.

use std::path::Path;

use clap::Args;

use super::ParserArgs;
use crate::deck::Section;
use crate::error::Result;
use crate::output::{plural, Printer};
use crate::registry::Registry;

/// List the keywords the registry knows
#[derive(Args, Debug)]
pub struct KeywordsArgs {
    #[command(flatten)]
    pub parser: ParserArgs,

    /// Only list keywords valid in this section
    #[arg(long)]
    pub section: Option<Section>,

    /// Show descriptions and wildcard patterns
    #[arg(long, short)]
    pub long: bool,
}

pub fn run(args: KeywordsArgs, config: Option<&Path>, printer: &Printer) -> Result<()> {
    let config = args.parser.resolve(config)?;
    let registry = config.registry()?;

    if args.long {
        print_details(&registry, args.section, printer);
    } else {
        print_inventory(&registry, args.section, printer);
    }

    printer.status(
        "Loaded",
        &plural(registry.len(), "keyword", "keywords"),
    );
    Ok(())
}

fn print_inventory(registry: &Registry, only: Option<Section>, printer: &Printer) {
    let anywhere = sorted_names(registry, |s| s.sections.is_empty());
    if only.is_none() && !anywhere.is_empty() {
        printer.info("Anywhere", &anywhere.join(", "));
    }

    for section in Section::ALL {
        if only.is_some_and(|o| o != section) {
            continue;
        }
        let names = sorted_names(registry, |s| s.sections.contains(&section));
        if names.is_empty() {
            continue;
        }
        printer.info(section.name(), &names.join(", "));
    }
}

fn print_details(registry: &Registry, only: Option<Section>, printer: &Printer) {
    let mut schemas: Vec<_> = registry
        .schemas()
        .filter(|s| only.map_or(true, |o| s.valid_in(o)))
        .collect();
    schemas.sort_by(|a, b| a.name.cmp(&b.name));

    for schema in schemas {
        let mut line = schema.description.clone().unwrap_or_default();
        if let Some(pattern) = &schema.match_pattern {
            line = format!("{} {}", line, printer.dim(&format!("(matches {})", pattern)));
        }
        printer.info(&schema.name, line.trim());
    }
}

fn sorted_names(
    registry: &Registry,
    filter: impl Fn(&crate::schema::KeywordSchema) -> bool,
) -> Vec<String> {
    let mut names: Vec<String> = registry
        .schemas()
        .filter(|s| filter(s))
        .map(|s| s.name.clone())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_names() {
        let registry = Registry::builtin().unwrap();
        let runspec = sorted_names(&registry, |s| s.sections.contains(&Section::Runspec));
        assert!(runspec.contains(&"DIMENS".to_string()));
        assert!(runspec.windows(2).all(|w| w[0] <= w[1]));
    }
}
