use bourse_models::Decision;

use crate::error::AgentError;

/// Remove markdown code-fence markers (```json and ```) and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    text.trim()
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Extract the first JSON object from a model response.
///
/// Handles the shapes models actually return:
/// - Clean JSON: `{"key": "value"}`
/// - Fenced: ```json\n{"key": "value"}\n```
/// - Prefix text: `Here is my decision:\n{"key": "value"}`
pub fn extract_json(text: &str) -> Result<String, AgentError> {
    let stripped = strip_code_fences(text);

    if stripped.starts_with('{') && serde_json::from_str::<serde_json::Value>(&stripped).is_ok() {
        return Ok(stripped);
    }

    if let Some(json_str) = extract_first_object(&stripped) {
        if serde_json::from_str::<serde_json::Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    Err(AgentError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

/// Find the first balanced { ... } in the text.
fn extract_first_object(text: &str) -> Option<String> {
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a [`Decision`] from raw model output.
pub fn parse_decision(raw: &str) -> Result<Decision, AgentError> {
    let json_str = extract_json(raw)?;
    let value: serde_json::Value = serde_json::from_str(&json_str)?;
    if !value.is_object() {
        return Err(AgentError::Parse(format!(
            "Decision must be a JSON object, got: {json_str}"
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| AgentError::Parse(format!("Failed to parse Decision: {e}\nJSON: {json_str}")))
}
