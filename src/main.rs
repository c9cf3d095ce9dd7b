mod cli;
mod config;
mod error;
mod generation;
mod server;
mod ui;

use clap::Parser;
use cli::{Cli, Commands};
use config::{LogFormat, LogLevel, Settings};
use error::{ContentError, ExitStatus};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging settings come from the config file when it loads; command
    // handlers report config errors themselves.
    let settings = config::load_config(cli.config.as_deref())
        .map(|c| c.settings)
        .unwrap_or_default();
    setup_logging(cli.verbose, cli.quiet, cli.log_format.as_deref(), &settings);
    ui::set_quiet_mode(cli.quiet);

    match run_command(cli).await {
        Ok(()) => ExitStatus::Success.into(),
        Err(e) => {
            ui::print_error(&e.to_string());
            e.exit_status().into()
        }
    }
}

async fn run_command(cli: Cli) -> Result<(), ContentError> {
    let config_path = cli.config;

    match cli.command {
        Some(Commands::Serve { bind }) => {
            let config = config::load_config(config_path.as_deref())?;
            cli::run_serve(&config, bind).await
        }

        Some(Commands::Topics {
            idea,
            instruction,
            json,
            api_key,
        }) => {
            let config = config::load_config(config_path.as_deref())?;
            cli::run_topics(&config, idea, instruction, json, api_key).await
        }

        Some(Commands::Generate {
            topic,
            notes,
            instruction,
            api_key,
        }) => {
            let config = config::load_config(config_path.as_deref())?;
            cli::run_generate(&config, topic, notes, instruction, api_key).await
        }

        Some(Commands::Optimize {
            optimization,
            file,
            api_key,
        }) => {
            let config = config::load_config(config_path.as_deref())?;
            cli::run_optimize(&config, optimization, file, api_key).await
        }

        Some(Commands::Config { command }) => cli::run_config(command, config_path.as_deref()),

        None => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().ok();
            Ok(())
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool, format: Option<&str>, settings: &Settings) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => match settings.log_level {
                LogLevel::Quiet => "error",
                LogLevel::Normal => "info",
                LogLevel::Verbose => "debug",
            },
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json = match format {
        Some(f) => f.eq_ignore_ascii_case("json"),
        None => settings.log_format == LogFormat::Json,
    };

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
