//! CLI entry point.
//!
//! Parses arguments, builds the [`CliContext`](parrot_cli::CliContext) once
//! and routes each command to its handler.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use parrot_cli::handlers::generate::GenerateArgs;
use parrot_cli::{
    CacheCommand, Cli, CliConfig, Commands, SettingsCommand, bootstrap, exit_code_for, handlers,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_cli(&cli)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(config).await?;

    match command {
        Commands::Generate {
            content,
            speaker,
            language,
        } => {
            handlers::generate::execute(&ctx, &content, GenerateArgs { speaker, language })
                .await?;
        }
        Commands::List => {
            handlers::materials::list(&ctx).await?;
        }
        Commands::Delete { id } => {
            handlers::materials::delete(&ctx, &id).await?;
        }
        Commands::Import { file } => {
            handlers::transfer::import(&ctx, &file).await?;
        }
        Commands::Export { ids, out } => {
            handlers::transfer::export(&ctx, &ids, &out).await?;
        }
        Commands::Pack { id, out } => {
            handlers::transfer::pack(&ctx, &id, out.as_deref()).await?;
        }
        Commands::Unpack { file } => {
            handlers::transfer::unpack(&ctx, &file).await?;
        }
        Commands::Cache { command } => match command {
            CacheCommand::Stats => {
                handlers::cache::stats(&ctx).await?;
            }
            CacheCommand::Clear { audio, text } => {
                handlers::cache::clear(&ctx, audio, text).await?;
            }
        },
        Commands::Play { id, from } => {
            handlers::play::execute(&ctx, &id, from).await?;
        }
        Commands::Settings { command } => match command {
            SettingsCommand::Show => {
                handlers::settings::show(&ctx).await?;
            }
            SettingsCommand::Set(args) => {
                handlers::settings::set(&ctx, args).await?;
            }
        },
    }

    Ok(())
}
