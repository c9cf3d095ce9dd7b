use std::fmt;

/// The three operations the service exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    FindTopics,
    Generate,
    Optimize,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::FindTopics => write!(f, "find-topics"),
            OperationKind::Generate => write!(f, "generate"),
            OperationKind::Optimize => write!(f, "optimize-script"),
        }
    }
}

/// Loosely structured user input. Which fields matter depends on the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptFields {
    /// Idea for topic discovery, or notes for script generation
    pub description: String,
    pub topic: String,
    pub script: String,
    /// Directive describing how a script should be optimized
    pub optimization: String,
}

const TOPICS_INSTRUCTIONS: &str = r#"Your task is to generate exactly 5 topics based on the idea.

Output Rules:
- Output ONLY pure JSON: no text, no explanation, no markdown.
- The JSON must be an array of exactly 5 objects.
- Each object must contain two string fields:
  • "topic": a short, specific topic derived from the idea
  • "description": clear guidance on how the script for that topic should be created (what to cover, angle, style, details to focus on)
- Example for the idea "Camera":
  [{"topic": "DSLR Settings for Beginners", "description": "Walk through aperture, shutter speed and ISO with one practical example each."}, ...]

Content Rules:
- Avoid sensitive topics entirely.
- If the idea is highly sensitive, you must still return 5 array elements, but each topic and description must politely decline to generate content while remaining valid JSON.

Quality Rules:
- Topics must NOT be broad.
- Topic names must be short.
- Descriptions should explain what the script should contain, which aspects to highlight, and how the content should be approached.

Your Output Format (strict):
[
{ "topic": "...", "description": "..." },
{ "topic": "...", "description": "..." },
{ "topic": "...", "description": "..." },
{ "topic": "...", "description": "..." },
{ "topic": "...", "description": "..." }
]"#;

const SCRIPT_INSTRUCTIONS: &str = "Please generate a clear, structured script with a hook, main points, and a CTA. Output as plain text which can be narrated under a minute";

/// Build the prompt for any operation.
///
/// Total over its inputs: absent or whitespace-only fields are treated as
/// empty and simply omitted from the prompt.
pub fn build_prompt(
    kind: OperationKind,
    fields: &PromptFields,
    custom_instruction: Option<&str>,
) -> String {
    match kind {
        OperationKind::FindTopics => build_topics_prompt(&fields.description, custom_instruction),
        OperationKind::Generate => {
            build_script_prompt(&fields.topic, &fields.description, custom_instruction)
        }
        OperationKind::Optimize => build_optimize_prompt(&fields.script, &fields.optimization),
    }
}

/// Build the prompt asking for five topic suggestions as a JSON array
pub fn build_topics_prompt(idea: &str, custom_instruction: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(instruction) = non_empty(custom_instruction) {
        parts.push(instruction.to_string());
    }
    if let Some(idea) = non_empty(Some(idea)) {
        parts.push(format!("Idea: {}", idea));
    }
    parts.push(TOPICS_INSTRUCTIONS.to_string());
    parts.join("\n\n")
}

/// Build the prompt asking for a short narratable script
pub fn build_script_prompt(topic: &str, notes: &str, custom_instruction: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(instruction) = non_empty(custom_instruction) {
        parts.push(instruction.to_string());
    }
    parts.push(format!("Topic: {}", topic.trim()));
    if let Some(notes) = non_empty(Some(notes)) {
        parts.push(format!("Notes: {}", notes));
    }
    parts.push(SCRIPT_INSTRUCTIONS.to_string());
    parts.join("\n\n")
}

/// Build the prompt asking for an optimized version of a script.
///
/// The script is embedded verbatim.
pub fn build_optimize_prompt(script: &str, optimization: &str) -> String {
    format!(
        r#"Optimize the following script based on this instruction: "{optimization}".

Return ONLY the optimized script text, with no commentary before or after it.

Script:
{script}
"#,
        optimization = optimization.trim(),
        script = script
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
