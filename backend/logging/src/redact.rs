//! Log Redaction Layer
//!
//! Scrubs credentials from strings and configuration objects before they are
//! logged. Plugin configs routinely carry API keys, so anything derived from
//! them must pass through here on its way to the log stream.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

/// Config keys whose values are always masked, whatever they contain.
const SECRET_KEYS: &[&str] = &["api_key", "apikey", "token", "secret", "password", "authorization"];

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]").to_string()
}

/// Returns a copy of a JSON value with secret-named keys masked and string
/// values scrubbed, recursively. Safe to log the result at any level.
pub fn redact_config_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let lowered = key.to_lowercase();
                    if SECRET_KEYS.iter().any(|secret| lowered.contains(secret)) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_config_json(inner))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_config_json).collect()),
        Value::String(text) => Value::String(redact_sensitive_data(text)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redaction() {
        let raw = "calling upstream with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(clean.contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn test_sk_keys_are_scrubbed() {
        let raw = "config loaded: sk-abcdefghijklmnopqrstuvwxyz123456";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("sk-abcdefghijklmnopqrstuvwxyz123456"));
    }

    #[test]
    fn test_config_masking_by_key_name() {
        let config = json!({
            "api_key": "super-secret-value",
            "API_TOKEN": "also-secret",
            "region": "eu-north",
            "nested": { "password": "hunter2", "depth": 3 }
        });
        let clean = redact_config_json(&config);
        assert_eq!(clean["api_key"], json!("[REDACTED]"));
        assert_eq!(clean["API_TOKEN"], json!("[REDACTED]"));
        assert_eq!(clean["region"], json!("eu-north"));
        assert_eq!(clean["nested"]["password"], json!("[REDACTED]"));
        assert_eq!(clean["nested"]["depth"], json!(3));
    }

    #[test]
    fn test_strings_inside_arrays_are_scrubbed() {
        let value = json!(["plain", "Bearer abc123token"]);
        let clean = redact_config_json(&value);
        assert_eq!(clean[0], json!("plain"));
        assert!(!clean[1].as_str().unwrap().contains("abc123token"));
    }
}
