use crate::config::UpstreamConfig;
use crate::error::{ContentError, Result, UPSTREAM_ERROR_PLACEHOLDER};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const X_GOOG_API_KEY: &str = "x-goog-api-key";

/// Raw reply from the generation endpoint, before any interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub http_status: u16,
    pub body_text: String,
    /// `None` when the body is not JSON
    pub parsed_json: Option<Value>,
}

impl UpstreamReply {
    /// Build a reply from a successful body
    pub fn from_body(http_status: u16, body_text: String) -> Self {
        let parsed_json = serde_json::from_str(&body_text).ok();
        UpstreamReply {
            http_status,
            body_text,
            parsed_json,
        }
    }
}

/// Sends a single prompt to the generation endpoint.
///
/// The credential travels with every call; implementations must not store
/// or log it.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn invoke(&self, prompt: &str, credential: &str) -> Result<UpstreamReply>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn single_turn(prompt: &'a str) -> Self {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

/// Gemini `generateContent` client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
}

impl GeminiClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if config.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_seconds));
        }
        let client = builder
            .build()
            .map_err(|e| ContentError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(GeminiClient {
            client,
            endpoint: config.endpoint(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify_transport_error(&self, error: reqwest::Error) -> ContentError {
        if error.is_timeout() {
            ContentError::UpstreamTimeout(self.timeout_seconds)
        } else {
            ContentError::UpstreamUnreachable(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl UpstreamClient for GeminiClient {
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    async fn invoke(&self, prompt: &str, credential: &str) -> Result<UpstreamReply> {
        if credential.trim().is_empty() {
            return Err(ContentError::MissingCredential);
        }

        let started = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header(X_GOOG_API_KEY, credential)
            .header("Content-Type", "application/json")
            .json(&GenerateContentRequest::single_turn(prompt))
            .send()
            .await
            .map_err(|e| {
                let err = self.classify_transport_error(e);
                warn!(error = %err, "Upstream request failed");
                err
            })?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Upstream responded"
        );

        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) if !text.trim().is_empty() => text,
                _ => UPSTREAM_ERROR_PLACEHOLDER.to_string(),
            };
            warn!(status = status.as_u16(), "Upstream returned an error status");
            return Err(ContentError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        let body_text = response.text().await.map_err(|e| {
            ContentError::UpstreamUnreachable(format!(
                "Failed to read response body: {}",
                e.without_url()
            ))
        })?;

        Ok(UpstreamReply::from_body(status.as_u16(), body_text))
    }
}
