//! Cardsmith CLI - Generate flashcards from documents.

use cardsmith_cli::commands;
use cardsmith_cli::{Cli, Command, Config, Formatter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Log to stderr so table/JSON output on stdout stays clean
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let color_enabled = !cli.no_color;
    if let Err(e) = run(cli).await {
        let formatter = Formatter::new(cardsmith_cli::config::OutputFormat::Table, color_enabled);
        eprintln!("{}", formatter.error(&e.to_string()));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> cardsmith_cli::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let store_path = config.resolve_store_path(cli.store)?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Generate(args) => {
            commands::execute_generate(args, &config, &store_path, &formatter).await?;
        }
        Command::List(args) => {
            commands::execute_list(args, &store_path, &formatter)?;
        }
        Command::Clean => {
            commands::execute_clean(&store_path, &formatter)?;
        }
    }

    Ok(())
}
