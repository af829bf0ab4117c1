//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
///
/// `config` is the loaded configuration; `init` ignores it and writes
/// defaults to `path`.
pub fn execute_config(args: ConfigArgs, config: &Config, path: &Path, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => init_config(path, force, formatter),
        ConfigAction::Show => show_config(config, path, formatter),
    }
}

/// Write a default configuration file.
fn init_config(path: &Path, force: bool, formatter: &Formatter) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save_to(path)?;
    println!("{}", formatter.success(&format!("Wrote default configuration to {}", path.display())));
    Ok(())
}

/// Print the effective configuration with secrets masked.
fn show_config(config: &Config, path: &Path, formatter: &Formatter) -> Result<()> {
    let shown = config.redacted();
    match formatter.format() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Table => {
            let source = if path.exists() {
                format!("Configuration file: {}", path.display())
            } else {
                format!("No file at {}, showing defaults", path.display())
            };
            println!("{}", formatter.info(&source));
            println!("{}", shown.to_toml()?);
        }
    }
    Ok(())
}
