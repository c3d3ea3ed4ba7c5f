//! Outbound request sanitizing.
//!
//! Some model identifiers reject generation parameters that others accept.
//! Every request body passes through [`sanitize_request`] right before it is
//! sent, so the client never needs per-model special cases.

use serde_json::{Map, Value};

/// Key holding generation parameters in a `generateContent` body.
const GENERATION_CONFIG: &str = "generationConfig";

/// Return `body` with unsupported parameters removed.
///
/// - every key named in `strip` is removed from `generationConfig`
/// - `null` values inside `generationConfig` are dropped
/// - an empty `generationConfig` is removed entirely
pub fn sanitize_request(mut body: Value, strip: &[String]) -> Value {
    let Some(root) = body.as_object_mut() else {
        return body;
    };

    let now_empty = match root.get_mut(GENERATION_CONFIG) {
        Some(Value::Object(config)) => {
            strip_keys(config, strip);
            config.is_empty()
        }
        Some(Value::Null) => true,
        _ => false,
    };

    if now_empty {
        root.remove(GENERATION_CONFIG);
    }
    body
}

fn strip_keys(config: &mut Map<String, Value>, strip: &[String]) {
    config.retain(|key, value| !value.is_null() && !strip.iter().any(|s| s == key));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_listed_params() {
        let body = json!({
            "contents": [{"parts": [{"text": "hi"}]}],
            "generationConfig": {"temperature": 0.7, "topK": 40, "maxOutputTokens": 2048}
        });
        let clean = sanitize_request(body, &["topK".to_string()]);
        assert_eq!(
            clean["generationConfig"],
            json!({"temperature": 0.7, "maxOutputTokens": 2048})
        );
        assert_eq!(clean["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn drops_nulls_and_empty_config() {
        let body = json!({
            "contents": [],
            "generationConfig": {"temperature": null}
        });
        let clean = sanitize_request(body, &[]);
        assert!(clean.get("generationConfig").is_none());
    }

    #[test]
    fn leaves_other_fields_untouched() {
        let body = json!({"contents": [], "safetySettings": [{"category": "x"}]});
        let clean = sanitize_request(body.clone(), &["safetySettings".to_string()]);
        assert_eq!(clean, body);
    }

    #[test]
    fn non_object_passes_through() {
        assert_eq!(sanitize_request(json!("text"), &[]), json!("text"));
    }
}
