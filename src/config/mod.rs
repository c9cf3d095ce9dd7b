mod types;

pub use types::*;

use crate::error::{ContentError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the XDG-compliant config directory
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "contentai")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| ContentError::Config("Could not determine config directory".to_string()))
}

/// Get the config file path, honoring an explicit override
pub fn config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(config_dir()?.join("config.toml")),
    }
}

/// Load the config.
///
/// A missing default file yields built-in defaults so the service can start
/// with no setup. An explicitly requested file must exist.
pub fn load_config(override_path: Option<&Path>) -> Result<Config> {
    let path = config_path(override_path)?;
    if !path.exists() {
        if override_path.is_some() {
            return Err(ContentError::ConfigNotFound(path.display().to_string()));
        }
        return Ok(Config::default());
    }
    load_config_from(&path)
}

/// Load config from a specific path
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(ContentError::ConfigNotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Save config to a specific path
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Execute the API key command and return the key
pub fn get_api_key(command: &str) -> Result<String> {
    if command.trim().is_empty() {
        return Err(ContentError::ApiKeyCommand(
            "API key command is empty".to_string(),
        ));
    }

    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).output()
    } else {
        Command::new("sh").args(["-c", command]).output()
    };

    match output {
        Ok(output) => {
            if output.status.success() {
                let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if key.is_empty() {
                    Err(ContentError::ApiKeyCommand(
                        "API key command returned empty output".to_string(),
                    ))
                } else {
                    Ok(key)
                }
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ContentError::ApiKeyCommand(format!(
                    "API key command failed: {}",
                    stderr.trim()
                )))
            }
        }
        Err(e) => Err(ContentError::ApiKeyCommand(format!(
            "Failed to execute API key command: {}",
            e
        ))),
    }
}

/// Redact sensitive information from config for display
pub fn redact_config(config: &Config) -> Config {
    let mut redacted = config.clone();
    if redacted.cli.api_key_command.is_some() {
        redacted.cli.api_key_command = Some("[REDACTED]".to_string());
    }
    redacted
}
