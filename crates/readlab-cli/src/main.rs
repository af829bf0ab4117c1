//! readlab CLI - summarize research papers into a digest.

use clap::Parser;
use readlab_cli::cli::ConfigAction;
use readlab_cli::commands;
use readlab_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> readlab_cli::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = Config::resolve(cli.config.as_deref())?;

    // A broken file must not stop `config init --force` from replacing it
    let mut config = match &cli.command {
        Command::Config(args) if matches!(args.action, ConfigAction::Init { .. }) => Config::default(),
        _ => Config::load_from(&path)?,
    };
    config.llm.apply_env()?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Ingest(args) => {
            commands::execute_ingest(args, &config, &formatter).await?;
        }
        Command::Summarize(args) => {
            commands::execute_summarize(args, &config, &formatter).await?;
        }
        Command::Run(args) => {
            commands::execute_run(args, &config, &formatter).await?;
        }
        Command::Aggregate(args) => {
            commands::execute_aggregate(args, &config, &formatter)?;
        }
        Command::Quality => {
            commands::execute_quality(&config, &formatter)?;
        }
        Command::Config(args) => {
            commands::execute_config(args, &config, &path, &formatter)?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
