use super::client::UpstreamReply;
use super::prompt::OperationKind;
use crate::error::{ContentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of suggestions a topic list must contain
pub const TOPIC_COUNT: usize = 5;

/// Returned in place of an empty free-text result
pub const EMPTY_OUTPUT_PLACEHOLDER: &str = "No output received";

const CANDIDATE_TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";
const FENCE: &str = "```";

/// One suggested topic, in the order the model produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSuggestion {
    pub topic: String,
    pub description: String,
}

/// The result promised to callers for each operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedResult {
    TopicList(Vec<TopicSuggestion>),
    PlainText(String),
}

impl NormalizedResult {
    /// The text handed back to callers: a compact JSON array for topic lists,
    /// the script itself otherwise
    pub fn response_text(&self) -> Result<String> {
        match self {
            NormalizedResult::TopicList(topics) => Ok(serde_json::to_string(topics)?),
            NormalizedResult::PlainText(text) => Ok(text.clone()),
        }
    }
}

impl UpstreamReply {
    /// Text of the first part of the first candidate, if the envelope has one
    pub fn candidate_text(&self) -> Option<&str> {
        self.parsed_json
            .as_ref()?
            .pointer(CANDIDATE_TEXT_POINTER)?
            .as_str()
            .filter(|text| !text.is_empty())
    }

    /// Generated text, falling back to the whole envelope.
    ///
    /// Never fails: an unexpected envelope shape is serialized as-is, and a
    /// body that is not JSON at all is returned verbatim.
    pub fn extract_text(&self) -> String {
        if let Some(text) = self.candidate_text() {
            return text.to_string();
        }
        match &self.parsed_json {
            Some(envelope) => envelope.to_string(),
            None => self.body_text.clone(),
        }
    }
}

/// Turn an upstream reply into the operation's result shape
pub fn normalize(kind: OperationKind, reply: &UpstreamReply) -> Result<NormalizedResult> {
    let text = reply.extract_text();
    let cleaned = strip_code_fence(&text);

    match kind {
        OperationKind::FindTopics => parse_topics(cleaned).map(NormalizedResult::TopicList),
        OperationKind::Generate | OperationKind::Optimize => {
            Ok(NormalizedResult::PlainText(clean_plain_text(cleaned)))
        }
    }
}

/// Remove a markdown code fence wrapped around the whole text.
///
/// The opening fence line (with any info string such as `json`) and the
/// closing fence are dropped and the inner content is trimmed. Text that is
/// not fenced is returned unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix(FENCE)
        .and_then(|rest| rest.strip_suffix(FENCE))
    else {
        return text;
    };

    let inner = match inner.find('\n') {
        Some(newline) => &inner[newline + 1..],
        None => strip_json_tag(inner),
    };
    inner.trim()
}

fn strip_json_tag(text: &str) -> &str {
    match text.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &text[4..],
        _ => text,
    }
}

fn clean_plain_text(text: &str) -> String {
    if text.trim().is_empty() {
        EMPTY_OUTPUT_PLACEHOLDER.to_string()
    } else {
        text.to_string()
    }
}

/// Parse the model's topic list.
///
/// The list must be a JSON array of exactly five objects. Missing or null
/// fields become empty strings; non-string scalars keep their JSON text.
pub fn parse_topics(text: &str) -> Result<Vec<TopicSuggestion>> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        ContentError::MalformedUpstreamOutput(format!("Topic list is not valid JSON: {}", e))
    })?;

    let Value::Array(items) = value else {
        return Err(ContentError::MalformedUpstreamOutput(
            "Topic list is not a JSON array".to_string(),
        ));
    };

    if items.len() != TOPIC_COUNT {
        return Err(ContentError::MalformedUpstreamOutput(format!(
            "Expected {} topics, got {}",
            TOPIC_COUNT,
            items.len()
        )));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item.as_object().ok_or_else(|| {
                ContentError::MalformedUpstreamOutput(format!(
                    "Topic {} is not a JSON object",
                    index + 1
                ))
            })?;
            Ok(TopicSuggestion {
                topic: string_field(object, "topic"),
                description: string_field(object, "description"),
            })
        })
        .collect()
}

fn string_field(object: &Map<String, Value>, name: &str) -> String {
    match object.get(name) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIVE_TOPICS: &str = r#"[
        {"topic": "Rain Barrels", "description": "Show a cheap rain barrel setup."},
        {"topic": "Compost Basics", "description": "Explain greens versus browns."},
        {"topic": "Native Plants", "description": "Pick three low-water natives."},
        {"topic": "No-Dig Beds", "description": "Build a lasagna bed step by step."},
        {"topic": "Seed Saving", "description": "Dry and store tomato seeds."}
    ]"#;

    fn envelope(text: &str) -> UpstreamReply {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
        })
        .to_string();
        UpstreamReply::from_body(200, body)
    }

    #[test]
    fn test_extract_text_from_candidate() {
        assert_eq!(envelope("hello").extract_text(), "hello");
    }

    #[test]
    fn test_extract_text_falls_back_to_envelope() {
        let reply = UpstreamReply::from_body(200, r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#.to_string());
        assert!(reply.candidate_text().is_none());
        let text = reply.extract_text();
        assert_eq!(
            serde_json::from_str::<Value>(&text).unwrap(),
            json!({"promptFeedback": {"blockReason": "SAFETY"}})
        );

        // Empty candidate text counts as absent
        let reply = envelope("");
        assert!(reply.extract_text().contains("candidates"));
    }

    #[test]
    fn test_extract_text_of_non_json_body() {
        let reply = UpstreamReply::from_body(200, "not json".to_string());
        assert_eq!(reply.extract_text(), "not json");
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```JSON\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fence("```\nplain\ntext\n```"), "plain\ntext");
        assert_eq!(strip_code_fence("```json[1]```"), "[1]");
        assert_eq!(strip_code_fence("no fences here"), "no fences here");
        assert_eq!(strip_code_fence("```"), "```");
    }

    #[test]
    fn test_strip_code_fence_is_idempotent() {
        let once = strip_code_fence("```json\n[{\"topic\": \"a\"}]\n```");
        assert_eq!(strip_code_fence(once), once);
    }

    #[test]
    fn test_fenced_and_unfenced_topics_match() {
        let fenced = format!("```json\n{}\n```", FIVE_TOPICS);
        let plain = normalize(OperationKind::FindTopics, &envelope(FIVE_TOPICS)).unwrap();
        let wrapped = normalize(OperationKind::FindTopics, &envelope(&fenced)).unwrap();
        assert_eq!(plain, wrapped);
    }

    #[test]
    fn test_parse_topics_exactly_five() {
        let topics = parse_topics(FIVE_TOPICS).unwrap();
        assert_eq!(topics.len(), TOPIC_COUNT);
        assert_eq!(topics[0].topic, "Rain Barrels");
        assert_eq!(topics[4].description, "Dry and store tomato seeds.");
    }

    #[test]
    fn test_parse_topics_fills_missing_fields() {
        let text = r#"[{"topic": "A"}, {"description": "B"}, {"topic": null}, {"topic": 7}, {}]"#;
        let topics = parse_topics(text).unwrap();
        assert_eq!(topics[0], TopicSuggestion { topic: "A".into(), description: String::new() });
        assert_eq!(topics[1].topic, "");
        assert_eq!(topics[1].description, "B");
        assert_eq!(topics[2].topic, "");
        assert_eq!(topics[3].topic, "7");
    }

    #[test]
    fn test_parse_topics_rejects_bad_shapes() {
        for text in [
            "Here are some topics!",
            r#"{"topic": "a", "description": "b"}"#,
            r#"[{"topic": "a", "description": "b"}]"#,
            r#"[1, 2, 3, 4, 5]"#,
        ] {
            assert!(
                matches!(parse_topics(text), Err(ContentError::MalformedUpstreamOutput(_))),
                "expected failure for {}",
                text
            );
        }
    }

    #[test]
    fn test_plain_text_is_returned_unmodified() {
        let narration = "Hook: Ever worked in pajamas?\n\nCTA: Follow for more.";
        let result = normalize(OperationKind::Generate, &envelope(narration)).unwrap();
        assert_eq!(result, NormalizedResult::PlainText(narration.to_string()));
    }

    #[test]
    fn test_plain_text_fence_is_stripped() {
        let result = normalize(OperationKind::Optimize, &envelope("```\nShorter script\n```")).unwrap();
        assert_eq!(result, NormalizedResult::PlainText("Shorter script".to_string()));
    }

    #[test]
    fn test_empty_plain_text_uses_placeholder() {
        let result = normalize(OperationKind::Optimize, &envelope("```\n\n```")).unwrap();
        assert_eq!(result, NormalizedResult::PlainText(EMPTY_OUTPUT_PLACEHOLDER.to_string()));
    }

    #[test]
    fn test_response_text_of_topic_list_round_trips() {
        let topics = parse_topics(FIVE_TOPICS).unwrap();
        let text = NormalizedResult::TopicList(topics.clone()).response_text().unwrap();
        let decoded: Vec<TopicSuggestion> = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, topics);
    }
}
