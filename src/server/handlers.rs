use super::AppState;
use crate::error::{ContentError, Result};
use crate::generation::{self, GenerationRequest, OperationKind};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

// Fields are optional and nullable; both read as empty strings.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindTopicsBody {
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateBody {
    pub topic: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizeBody {
    pub script: Option<String>,
    pub opt_type: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptimizedResponse {
    pub optimized: String,
}

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// `POST /api/find-topics`
pub async fn find_topics(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FindTopicsBody>, JsonRejection>,
) -> Response {
    respond(OperationKind::FindTopics, async move {
        let Json(body) = payload.map_err(invalid_body)?;
        let request = GenerationRequest::find_topics(
            body.description.unwrap_or_default(),
            body.instruction,
            body.api_key.unwrap_or_default(),
        );
        let text = execute(&state, &request).await?;
        Ok::<_, ContentError>(Json(TextResponse { text }))
    })
    .await
}

/// `POST /api/generate`
pub async fn generate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateBody>, JsonRejection>,
) -> Response {
    respond(OperationKind::Generate, async move {
        let Json(body) = payload.map_err(invalid_body)?;
        let request = GenerationRequest::generate(
            body.topic.unwrap_or_default(),
            body.description.unwrap_or_default(),
            body.instruction,
            body.api_key.unwrap_or_default(),
        );
        let text = execute(&state, &request).await?;
        Ok::<_, ContentError>(Json(TextResponse { text }))
    })
    .await
}

/// `POST /api/optimize-script`
pub async fn optimize_script(
    State(state): State<AppState>,
    payload: std::result::Result<Json<OptimizeBody>, JsonRejection>,
) -> Response {
    respond(OperationKind::Optimize, async move {
        let Json(body) = payload.map_err(invalid_body)?;
        let request = GenerationRequest::optimize(
            body.script.unwrap_or_default(),
            body.opt_type.unwrap_or_default(),
            body.api_key.unwrap_or_default(),
        );
        let optimized = execute(&state, &request).await?;
        Ok::<_, ContentError>(Json(OptimizedResponse { optimized }))
    })
    .await
}

fn invalid_body(rejection: JsonRejection) -> ContentError {
    ContentError::InvalidRequest(rejection.body_text())
}

/// Run a handler body inside a per-request span.
///
/// Errors are turned into responses inside the span so their log lines carry
/// the request id.
async fn respond<F, T>(operation: OperationKind, work: F) -> Response
where
    F: Future<Output = Result<T>>,
    T: IntoResponse,
{
    let span = info_span!("request", request_id = %Uuid::new_v4(), operation = %operation);
    async move {
        let started = Instant::now();
        match work.await {
            Ok(body) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Request completed"
                );
                body.into_response()
            }
            Err(e) => e.into_response(),
        }
    }
    .instrument(span)
    .await
}

async fn execute(state: &AppState, request: &GenerationRequest) -> Result<String> {
    let result = generation::run(state.client.as_ref(), request).await?;
    result.response_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::StubClient;
    use crate::generation::TopicSuggestion;
    use crate::server::error::ErrorBody;
    use serde::de::DeserializeOwned;
    use std::io;
    use std::sync::{Arc, Mutex};

    const TOPICS: &str = r#"[{"topic":"Rain Barrels","description":"Cheap setup."},{"topic":"Compost Basics","description":"Greens and browns."},{"topic":"Native Plants","description":"Low water."},{"topic":"No-Dig Beds","description":"Lasagna method."},{"topic":"Seed Saving","description":"Tomato seeds."}]"#;

    fn state_with(stub: Arc<StubClient>) -> AppState {
        AppState::new(stub)
    }

    async fn body_of<T: DeserializeOwned>(response: Response) -> (StatusCode, T) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Log sink shared with a test subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    #[tokio::test]
    async fn test_find_topics_returns_five_entries() {
        let stub = Arc::new(StubClient::with_text(&format!("```json\n{}\n```", TOPICS)));
        let body = FindTopicsBody {
            description: Some("sustainable gardening".into()),
            api_key: Some("key".into()),
            ..Default::default()
        };

        let response = find_topics(State(state_with(stub.clone())), Ok(Json(body))).await;
        let (status, response): (_, TextResponse) = body_of(response).await;

        assert_eq!(status, StatusCode::OK);
        let topics: Vec<TopicSuggestion> = serde_json::from_str(&response.text).unwrap();
        let expected: Vec<TopicSuggestion> = serde_json::from_str(TOPICS).unwrap();
        assert_eq!(topics, expected);
        assert_eq!(response.text, TOPICS);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_find_topics_missing_key() {
        let stub = Arc::new(StubClient::with_text(TOPICS));
        let body = FindTopicsBody {
            description: Some("sustainable gardening".into()),
            ..Default::default()
        };

        let response = find_topics(State(state_with(stub.clone())), Ok(Json(body))).await;
        let (status, body): (_, ErrorBody) = body_of(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Missing API key");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_null_fields_read_as_missing() {
        let stub = Arc::new(StubClient::with_text(TOPICS));
        let body: FindTopicsBody = serde_json::from_value(json!({
            "description": "sustainable gardening",
            "instruction": null,
            "apiKey": null
        }))
        .unwrap();

        let response = find_topics(State(state_with(stub.clone())), Ok(Json(body))).await;
        let (status, body): (_, ErrorBody) = body_of(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Missing API key");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_rejection_is_logged_with_request_id() {
        let logs = CapturedLogs::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let stub = Arc::new(StubClient::with_text("unused"));
        let body = OptimizeBody {
            script: Some("Hello world script".into()),
            ..Default::default()
        };
        let response = optimize_script(State(state_with(stub)), Ok(Json(body))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let output = logs.contents();
        let line = output
            .lines()
            .find(|line| line.contains("Request rejected"))
            .unwrap_or_else(|| panic!("no rejection logged in: {}", output));
        assert!(line.contains("request_id="), "line without request id: {}", line);
        assert!(line.contains("operation=optimize-script"));
    }

    #[tokio::test]
    async fn test_find_topics_malformed_output_is_500() {
        let stub = Arc::new(StubClient::with_text("Sorry, I can't help with that."));
        let body = FindTopicsBody {
            description: Some("anything".into()),
            api_key: Some("key".into()),
            ..Default::default()
        };

        let response = find_topics(State(state_with(stub)), Ok(Json(body))).await;
        let (status, body): (_, ErrorBody) = body_of(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error.starts_with("Malformed upstream output"));
    }

    #[tokio::test]
    async fn test_generate_returns_narration_unmodified() {
        let narration = "Hook: Imagine skipping the commute forever.\nPoint 1: ...\nCTA: Follow for more!";
        let stub = Arc::new(StubClient::with_text(narration));
        let body = GenerateBody {
            topic: Some("Benefits of Remote Work".into()),
            description: Some(String::new()),
            api_key: Some("key".into()),
            ..Default::default()
        };

        let response = generate(State(state_with(stub.clone())), Ok(Json(body))).await;
        let (status, response): (_, TextResponse) = body_of(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.text, narration);
        let prompt = stub.last_prompt().unwrap();
        assert!(prompt.starts_with("Topic: Benefits of Remote Work"));
        assert!(!prompt.contains("Notes:"));
    }

    #[tokio::test]
    async fn test_generate_propagates_upstream_status() {
        for status in [429u16, 500] {
            let stub = Arc::new(StubClient::with_status(status, "Resource exhausted"));
            let body = GenerateBody {
                topic: Some("Topic".into()),
                api_key: Some("key".into()),
                ..Default::default()
            };

            let response = generate(State(state_with(stub)), Ok(Json(body))).await;
            let (code, body): (_, ErrorBody) = body_of(response).await;

            assert_eq!(code.as_u16(), status);
            assert_eq!(body.error, "Resource exhausted");
        }
    }

    #[tokio::test]
    async fn test_optimize_missing_directive_is_400() {
        let stub = Arc::new(StubClient::with_text("unused"));
        let body = OptimizeBody {
            script: Some("Hello world script".into()),
            opt_type: Some(String::new()),
            api_key: Some("key".into()),
        };

        let response = optimize_script(State(state_with(stub.clone())), Ok(Json(body))).await;
        let (status, body): (_, ErrorBody) = body_of(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Missing input");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_optimize_returns_optimized_field() {
        let stub = Arc::new(StubClient::with_text("```\nHello, world!\n```"));
        let body = OptimizeBody {
            script: Some("Hello world script".into()),
            opt_type: Some("add punctuation".into()),
            api_key: Some("key".into()),
        };

        let response = optimize_script(State(state_with(stub)), Ok(Json(body))).await;
        let (status, response): (_, OptimizedResponse) = body_of(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.optimized, "Hello, world!");
    }
}
