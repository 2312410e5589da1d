use clap::Parser;
use ecldeck::cli::{init_logging, Cli, Commands};
use ecldeck::output::Printer;
use miette::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let printer = Printer::new();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Parse(args) => ecldeck::cli::parse::run(args, config, &printer)?,
        Commands::Check(args) => ecldeck::cli::check::run(args, config, &printer)?,
        Commands::Keywords(args) => ecldeck::cli::keywords::run(args, config, &printer)?,
        Commands::Completions(args) => ecldeck::cli::completions::run(args)?,
    }

    Ok(())
}
