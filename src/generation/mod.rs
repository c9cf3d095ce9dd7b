mod client;
mod prompt;
mod response;

pub use client::{GeminiClient, UpstreamClient, UpstreamReply};
pub use prompt::*;
pub use response::*;

use crate::error::{ContentError, Result};
use tracing::{debug, instrument};

/// A single request-scoped call into one of the three operations
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: OperationKind,
    pub fields: PromptFields,
    pub custom_instruction: Option<String>,
    pub credential: String,
}

impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("custom_instruction", &self.custom_instruction)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

impl GenerationRequest {
    /// Topic discovery for an idea
    pub fn find_topics(idea: String, instruction: Option<String>, credential: String) -> Self {
        GenerationRequest {
            kind: OperationKind::FindTopics,
            fields: PromptFields {
                description: idea,
                ..Default::default()
            },
            custom_instruction: instruction,
            credential,
        }
    }

    /// Script generation for a topic, with optional notes
    pub fn generate(
        topic: String,
        notes: String,
        instruction: Option<String>,
        credential: String,
    ) -> Self {
        GenerationRequest {
            kind: OperationKind::Generate,
            fields: PromptFields {
                topic,
                description: notes,
                ..Default::default()
            },
            custom_instruction: instruction,
            credential,
        }
    }

    /// Optimization of an existing script according to a directive
    pub fn optimize(script: String, optimization: String, credential: String) -> Self {
        GenerationRequest {
            kind: OperationKind::Optimize,
            fields: PromptFields {
                script,
                optimization,
                ..Default::default()
            },
            custom_instruction: None,
            credential,
        }
    }

    /// Check the credential and the operation's primary fields
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.credential) {
            return Err(ContentError::MissingCredential);
        }

        match self.kind {
            OperationKind::FindTopics if is_blank(&self.fields.description) => Err(
                ContentError::MissingInput("Missing idea description".to_string()),
            ),
            OperationKind::Generate if is_blank(&self.fields.topic) => {
                Err(ContentError::MissingInput("Missing topic".to_string()))
            }
            OperationKind::Optimize
                if is_blank(&self.fields.script) || is_blank(&self.fields.optimization) =>
            {
                Err(ContentError::MissingInput("Missing input".to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn prompt(&self) -> String {
        build_prompt(self.kind, &self.fields, self.custom_instruction.as_deref())
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validate, build the prompt, call the upstream endpoint once and normalize
/// the reply.
#[instrument(skip_all, fields(operation = %request.kind))]
pub async fn run(client: &dyn UpstreamClient, request: &GenerationRequest) -> Result<NormalizedResult> {
    request.validate()?;

    let prompt = request.prompt();
    debug!(prompt_len = prompt.len(), "Built prompt");

    let reply = client.invoke(&prompt, &request.credential).await?;
    let result = normalize(request.kind, &reply)?;

    if let NormalizedResult::TopicList(topics) = &result {
        debug!(count = topics.len(), "Parsed topic suggestions");
    }
    Ok(result)
}
