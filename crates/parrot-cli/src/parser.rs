//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Listening-practice material manager.
#[derive(Parser)]
#[command(name = "parrot")]
#[command(about = "Generate, store and play listening-practice materials")]
#[command(version)]
pub struct Cli {
    /// SQLite database file (defaults to the platform data directory)
    #[arg(long = "db", env = "PARROT_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Base URL of the speech synthesizer
    #[arg(long = "synth-url", env = "PARROT_SYNTH_URL", global = true)]
    pub synth_url: Option<String>,

    /// Base URL of the forced aligner
    #[arg(long = "aligner-url", env = "PARROT_ALIGNER_URL", global = true)]
    pub aligner_url: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "parrot",
            "--db",
            "/tmp/parrot.db",
            "--synth-url",
            "http://localhost:5002",
            "list",
        ]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/parrot.db")));
        assert_eq!(cli.synth_url.as_deref(), Some("http://localhost:5002"));
        assert!(matches!(cli.command, Some(Commands::List)));
    }
}
