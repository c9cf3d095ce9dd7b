use std::process::ExitCode;
use thiserror::Error;

/// Process exit codes for the terminal commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    GeneralError = 1,
    InputError = 2,
    UpstreamError = 3,
    Timeout = 5,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

/// Placeholder used when the upstream error body is empty or unreadable
pub const UPSTREAM_ERROR_PLACEHOLDER: &str = "Upstream error";

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}")]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    MissingInput(String),

    #[error("Missing API key")]
    MissingCredential,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream returned status {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("Upstream timeout after {0} seconds")]
    UpstreamTimeout(u64),

    #[error("Malformed upstream output: {0}")]
    MalformedUpstreamOutput(String),

    #[error("API key command failed: {0}")]
    ApiKeyCommand(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl ContentError {
    /// Convert error to appropriate exit status
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ContentError::MissingInput(_)
            | ContentError::MissingCredential
            | ContentError::InvalidRequest(_) => ExitStatus::InputError,

            ContentError::UpstreamHttp { .. }
            | ContentError::UpstreamUnreachable(_)
            | ContentError::MalformedUpstreamOutput(_) => ExitStatus::UpstreamError,

            ContentError::UpstreamTimeout(_) => ExitStatus::Timeout,

            ContentError::Config(_)
            | ContentError::ConfigNotFound(_)
            | ContentError::ConfigInvalid(_)
            | ContentError::Io(_)
            | ContentError::TomlParse(_)
            | ContentError::TomlSerialize(_)
            | ContentError::Json(_)
            | ContentError::ApiKeyCommand(_)
            | ContentError::Server(_) => ExitStatus::GeneralError,
        }
    }

    /// HTTP status reported to callers of the service
    pub fn http_status(&self) -> u16 {
        match self {
            ContentError::MissingInput(_)
            | ContentError::MissingCredential
            | ContentError::InvalidRequest(_) => 400,
            ContentError::UpstreamHttp { status, .. } if (400..=599).contains(status) => *status,
            ContentError::UpstreamHttp { .. } => 502,
            _ => 500,
        }
    }

    /// Message placed in the `error` field of a failure body.
    ///
    /// Upstream HTTP failures surface the upstream body itself so the caller
    /// sees what the provider said.
    pub fn public_message(&self) -> String {
        match self {
            ContentError::UpstreamHttp { body, .. } if !body.trim().is_empty() => body.clone(),
            ContentError::UpstreamHttp { .. } => UPSTREAM_ERROR_PLACEHOLDER.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
