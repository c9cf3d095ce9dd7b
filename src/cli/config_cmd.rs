use crate::cli::ConfigCommands;
use crate::config::{self, Config};
use crate::error::{ContentError, Result};
use crate::ui;
use std::path::Path;

/// Run config subcommands
pub fn run_config(command: ConfigCommands, override_path: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommands::Show => show_config(override_path),
        ConfigCommands::Path => print_path(override_path),
        ConfigCommands::Init { force } => init_config(override_path, force),
        ConfigCommands::Validate => validate_config(override_path),
    }
}

fn show_config(override_path: Option<&Path>) -> Result<()> {
    let config = config::load_config(override_path)?;
    let redacted = config::redact_config(&config);
    let content = toml::to_string_pretty(&redacted)
        .map_err(|e| ContentError::Config(format!("Failed to serialize config: {}", e)))?;
    println!("{}", content);
    Ok(())
}

fn print_path(override_path: Option<&Path>) -> Result<()> {
    let path = config::config_path(override_path)?;
    println!("{}", path.display());
    Ok(())
}

fn init_config(override_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config::config_path(override_path)?;
    if path.exists() && !force {
        return Err(ContentError::Config(format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    config::save_config_to(&Config::default(), &path)?;
    ui::print_success(&format!("Wrote default config to {}", path.display()));
    Ok(())
}

fn validate_config(override_path: Option<&Path>) -> Result<()> {
    let config = config::load_config(override_path)?;

    match config.validate() {
        Ok(()) => {
            ui::print_success("Config is valid");
            Ok(())
        }
        Err(errors) => {
            for error in errors {
                ui::print_error(&error);
            }
            Err(ContentError::ConfigInvalid(
                "Config validation failed".to_string(),
            ))
        }
    }
}
