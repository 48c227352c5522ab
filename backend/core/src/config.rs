//! Resolved per-user plugin configuration.
//!
//! Merging shared plugin settings with a user's own values (and deciding the
//! precedence between them) belongs to the [`crate::traits::ConfigStore`]
//! implementation. What arrives here is the finished result: a flat map of
//! keys the runtimes read from but never write back.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for one (plugin, user) pair after merging.
///
/// Well-known keys the runtimes look for:
/// - `api_key`: bearer credential for upstream calls and sandbox model access
/// - `api_base`: base URL override for sandbox model access
/// - `model`: model name for sandbox model access
/// - `timeout_ms`: per-call HTTP timeout override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig(BTreeMap<String, Value>);

impl ResolvedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`, if present and actually a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// The credential runtimes attach to outbound calls, when configured.
    pub fn api_key(&self) -> Option<&str> {
        self.get_str("api_key")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// The full map as one JSON object, for handing into the sandbox.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl From<BTreeMap<String, Value>> for ResolvedConfig {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for ResolvedConfig {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ResolvedConfig {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResolvedConfig {
        [
            ("api_key".to_string(), json!("sk-test-123")),
            ("timeout_ms".to_string(), json!(5000)),
            ("region".to_string(), json!("eu-north")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn typed_getters_ignore_wrong_types() {
        let config = sample();
        assert_eq!(config.get_str("api_key"), Some("sk-test-123"));
        assert_eq!(config.get_str("timeout_ms"), None);
        assert_eq!(config.get_u64("timeout_ms"), Some(5000));
        assert_eq!(config.get_u64("region"), None);
        assert_eq!(config.get("missing"), None);
    }

    #[test]
    fn api_key_reads_the_well_known_key() {
        assert_eq!(sample().api_key(), Some("sk-test-123"));
        assert_eq!(ResolvedConfig::new().api_key(), None);
    }

    #[test]
    fn to_value_produces_the_whole_object() {
        let value = sample().to_value();
        assert_eq!(
            value,
            json!({
                "api_key": "sk-test-123",
                "region": "eu-north",
                "timeout_ms": 5000
            })
        );
    }

    #[test]
    fn serde_round_trip_is_a_plain_object() {
        let config = sample();
        let encoded = serde_json::to_value(&config).unwrap();
        assert!(encoded.is_object());
        let decoded: ResolvedConfig = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, config);
    }
}
