mod compose;
mod config_cmd;
mod serve;

pub use compose::{run_generate, run_optimize, run_topics};
pub use config_cmd::run_config;
pub use serve::run_serve;

use crate::config::{self, CliConfig};
use crate::error::{ContentError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "contentai")]
#[command(author, version, about = "Find topics, write and optimize short video scripts with Gemini")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (can repeat: -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log format: text (default) or json
    #[arg(long, value_name = "FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Override the configured bind address (host:port)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Suggest five specific topics for an idea
    Topics {
        /// The idea to find topics for
        idea: String,

        /// Custom instruction (defaults to the configured one)
        #[arg(long)]
        instruction: Option<String>,

        /// Print the topic list as JSON
        #[arg(long)]
        json: bool,

        /// Gemini API key (defaults to the configured api_key_command)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },

    /// Write a short narratable script for a topic
    Generate {
        /// Topic of the script
        topic: String,

        /// Extra notes for the script
        #[arg(long, default_value = "")]
        notes: String,

        /// Custom instruction (defaults to the configured one)
        #[arg(long)]
        instruction: Option<String>,

        /// Gemini API key (defaults to the configured api_key_command)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },

    /// Optimize an existing script
    Optimize {
        /// How the script should be optimized (e.g. "make it shorter")
        optimization: String,

        /// Read the script from this file instead of stdin
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Gemini API key (defaults to the configured api_key_command)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show config (secrets redacted)
    Show,

    /// Print config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate config file
    Validate,
}

/// Resolve the credential for a terminal command.
///
/// An explicit `--api-key` wins, then the configured key command.
pub(crate) fn resolve_api_key(flag: Option<String>, cli: &CliConfig) -> Result<String> {
    if let Some(key) = flag.filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }
    match cli.api_key_command.as_deref() {
        Some(command) => config::get_api_key(command),
        None => Err(ContentError::MissingCredential),
    }
}

/// Resolve the custom instruction for a terminal command
pub(crate) fn resolve_instruction(flag: Option<String>, cli: &CliConfig) -> Option<String> {
    flag.or_else(|| cli.instruction.clone())
}
