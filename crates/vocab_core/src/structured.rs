//! crates/vocab_core/src/structured.rs
//!
//! Turns model output into JSON objects.
//!
//! Providers with a native JSON response mode go through [`parse_json_object`].
//! Providers without one are asked for JSON in the prompt and their free-form reply
//! goes through [`extract_json_object`], which scans for balanced top-level `{...}`
//! blocks. The extraction is best-effort and a known source of
//! [`PortError::MalformedResponse`].

use crate::domain::JsonObject;
use crate::ports::{PortError, PortResult};

/// Appended to the user instruction for providers that cannot constrain output to JSON.
pub const JSON_ONLY_INSTRUCTION: &str =
    "반드시 유효한 JSON 형식으로만 응답하세요. 다른 텍스트는 포함하지 마세요.";

/// Strictly parses `text` as a single JSON object.
pub fn parse_json_object(text: &str) -> PortResult<JsonObject> {
    match serde_json::from_str::<serde_json::Value>(text.trim()) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(PortError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(PortError::MalformedResponse(format!(
            "response is not valid JSON: {}",
            e
        ))),
    }
}

/// Returns the first balanced top-level `{...}` block of `text` that parses as a JSON object.
pub fn extract_json_object(text: &str) -> PortResult<JsonObject> {
    top_level_blocks(text)
        .find_map(|block| match serde_json::from_str::<serde_json::Value>(block) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        })
        .ok_or_else(|| {
            PortError::MalformedResponse("no valid JSON object found in model output".to_string())
        })
}

/// Yields every balanced top-level brace block in order. Braces inside string
/// literals are ignored; an unterminated trailing block yields nothing.
fn top_level_blocks(text: &str) -> impl Iterator<Item = &str> + '_ {
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    text.char_indices().filter_map(move |(i, c)| {
        if depth == 0 {
            if c == '{' {
                depth = 1;
                start = i;
                in_string = false;
                escaped = false;
            }
            return None;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            return None;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
        None
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_object_wrapped_in_prose_and_fences() {
        let reply = "Sure! Here you go:\n```json\n{\"word\": \"run\", \"coreMeanings\": [{\"meaning\": \"달리다\"}]}\n```\nEnjoy.";
        let obj = extract_json_object(reply).unwrap();
        assert_eq!(obj["word"], json!("run"));
        assert_eq!(obj["coreMeanings"][0]["meaning"], json!("달리다"));
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_the_scanner() {
        let reply = r#"{"sentence": "use } and { freely", "note": "quote \" then }"}"#;
        let obj = extract_json_object(reply).unwrap();
        assert_eq!(obj["sentence"], json!("use } and { freely"));
    }

    #[test]
    fn skips_blocks_that_are_not_json() {
        let reply = "{not json at all} then {\"ok\": true}";
        let obj = extract_json_object(reply).unwrap();
        assert_eq!(obj["ok"], json!(true));
    }

    #[test]
    fn truncated_output_is_malformed() {
        let reply = "{\"word\": \"run\", \"coreMeanings\": [";
        assert!(matches!(
            extract_json_object(reply),
            Err(PortError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_json_object("no braces here"),
            Err(PortError::MalformedResponse(_))
        ));
    }

    #[test]
    fn strict_parse_rejects_non_objects() {
        assert!(parse_json_object(" {\"a\": 1} ").is_ok());
        assert!(matches!(
            parse_json_object("[1, 2]"),
            Err(PortError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_json_object("{\"a\": "),
            Err(PortError::MalformedResponse(_))
        ));
    }
}
