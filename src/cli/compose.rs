use super::{resolve_api_key, resolve_instruction};
use crate::config::Config;
use crate::error::Result;
use crate::generation::{self, GeminiClient, GenerationRequest, NormalizedResult};
use crate::ui::{self, Spinner};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

/// Run the topics command
pub async fn run_topics(
    config: &Config,
    idea: String,
    instruction: Option<String>,
    json: bool,
    api_key: Option<String>,
) -> Result<()> {
    let credential = resolve_api_key(api_key, &config.cli)?;
    let request = GenerationRequest::find_topics(
        idea,
        resolve_instruction(instruction, &config.cli),
        credential,
    );

    match execute(config, &request, "Finding topics...").await? {
        NormalizedResult::TopicList(topics) if !json => ui::print_topics(&topics),
        result => println!("{}", result.response_text()?),
    }
    Ok(())
}

/// Run the generate command
pub async fn run_generate(
    config: &Config,
    topic: String,
    notes: String,
    instruction: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let credential = resolve_api_key(api_key, &config.cli)?;
    let request = GenerationRequest::generate(
        topic,
        notes,
        resolve_instruction(instruction, &config.cli),
        credential,
    );

    let result = execute(config, &request, "Writing script...").await?;
    println!("{}", result.response_text()?);
    Ok(())
}

/// Run the optimize command, reading the script from a file or stdin
pub async fn run_optimize(
    config: &Config,
    optimization: String,
    file: Option<PathBuf>,
    api_key: Option<String>,
) -> Result<()> {
    let script = match file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let credential = resolve_api_key(api_key, &config.cli)?;
    let request = GenerationRequest::optimize(script, optimization, credential);

    let result = execute(config, &request, "Optimizing script...").await?;
    println!("{}", result.response_text()?);
    Ok(())
}

async fn execute(
    config: &Config,
    request: &GenerationRequest,
    message: &str,
) -> Result<NormalizedResult> {
    // Fail on bad input before touching the network or drawing a spinner
    request.validate()?;

    let client = GeminiClient::new(&config.upstream)?;
    let spinner = Spinner::new(message);
    match generation::run(&client, request).await {
        Ok(result) => {
            spinner.finish_and_clear();
            Ok(result)
        }
        Err(e) => {
            spinner.finish_with_error("Request failed");
            Err(e)
        }
    }
}
