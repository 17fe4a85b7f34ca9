use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "rice",
    about = "Embed resource directories into Go binaries.",
    version
)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Embed boxes as .syso objects with a registering helper source")]
    EmbedSyso(EmbedSysoArgs),

    #[command(about = "Remove files generated for a package")]
    Clean(CleanArgs),

    #[command(visible_aliases = ["l", "ls"], about = "List the box held by a .syso object")]
    List(ListArgs),
}

#[derive(Debug, clap::Args)]
#[command(after_help = "\
When SOURCE_DATE_EPOCH is set, it is used as the creation time of every box.")]
pub struct EmbedSysoArgs {
    /// Directory of the Go package to embed boxes for
    #[arg(short = 'i', long = "package-dir", default_value = ".")]
    pub package_dir: PathBuf,

    /// Box to embed, relative to the package directory (skips source scanning)
    #[arg(short = 'b', long = "box", value_name = "NAME")]
    pub boxes: Vec<String>,

    /// Package identifier for the helper source (defaults to the package clause)
    #[arg(long, value_name = "IDENT")]
    pub package_name: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct CleanArgs {
    /// Directory of the Go package to clean
    #[arg(short = 'i', long = "package-dir", default_value = ".")]
    pub package_dir: PathBuf,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Path to a .rice-box.syso object
    pub syso: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embed_syso() {
        let cli = Cli::try_parse_from([
            "rice",
            "-v",
            "embed-syso",
            "-i",
            "cmd/server",
            "-b",
            "assets",
            "--box",
            "../shared",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::EmbedSyso(args) => {
                assert_eq!(args.package_dir, PathBuf::from("cmd/server"));
                assert_eq!(args.boxes, vec!["assets", "../shared"]);
                assert!(args.package_name.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn package_dir_defaults_to_current() {
        let cli = Cli::try_parse_from(["rice", "clean"]).unwrap();
        match cli.command {
            Commands::Clean(args) => assert_eq!(args.package_dir, PathBuf::from(".")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
