mod cli;
mod commands;
mod error;
mod package;
mod util;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    let cli = Cli::parse_from(wild::args_os());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("rice=debug,ricebox_format=debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::EmbedSyso(args) => commands::embed_syso(args)?,
        Commands::Clean(args) => commands::clean(args)?,
        Commands::List(args) => commands::list(args)?,
    };

    Ok(())
}
