//! Skill manifest model.
//!
//! A manifest describes what a plugin can do: the functions it exposes, the
//! parameters each function accepts, and, depending on the runtime, either
//! the JavaScript source to run or the HTTP endpoint to call. Manifests are
//! stored as JSON alongside the plugin record and parsed on every execution,
//! so the shapes here stay permissive: unknown fields are ignored and
//! optional sections default to empty.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use anyhow::{bail, Result};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Runtime kind
// ---------------------------------------------------------------------------

/// How a plugin's functions are executed.
///
/// Stored as a plain string in plugin records; values outside the known set
/// are preserved in `Unknown` so that a record written by a newer service
/// version still round-trips instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuntimeKind {
    /// Proxy the call to an external HTTP API.
    ApiCall,
    /// Run bundled JavaScript source in the embedded sandbox.
    Nodejs,
    /// Reserved: deliver the call to a registered webhook.
    Webhook,
    /// Anything else found in storage.
    Unknown(String),
}

impl RuntimeKind {
    pub fn as_str(&self) -> &str {
        match self {
            RuntimeKind::ApiCall => "api_call",
            RuntimeKind::Nodejs => "nodejs",
            RuntimeKind::Webhook => "webhook",
            RuntimeKind::Unknown(other) => other,
        }
    }
}

impl From<&str> for RuntimeKind {
    fn from(value: &str) -> Self {
        match value {
            "api_call" => RuntimeKind::ApiCall,
            "nodejs" => RuntimeKind::Nodejs,
            "webhook" => RuntimeKind::Webhook,
            other => RuntimeKind::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RuntimeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RuntimeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RuntimeKind::from(raw.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Parameter schema
// ---------------------------------------------------------------------------

/// JSON type a parameter value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// A string restricted to the values listed in [`ParamDef::allowed`].
    Enum,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Enum => "enum",
        }
    }
}

/// Declaration of a single function parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    #[serde(rename = "type")]
    pub kind: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Filled in for absent optional parameters before dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Inclusive lower bound, numbers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound, numbers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Closed value set for `enum` parameters.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Functions and the manifest itself
// ---------------------------------------------------------------------------

/// One callable function exposed by a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameter declarations keyed by parameter name. `BTreeMap` keeps
    /// serialized manifests (and violation lists) in a stable order.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamDef>,
}

/// Parsed plugin manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillManifest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    /// JavaScript source for `nodejs` plugins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    /// Upstream URL for `api_call` plugins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl SkillManifest {
    /// Looks up a function by name.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Structural checks applied when a manifest is registered or updated.
    ///
    /// Execution-time validation of call arguments lives in
    /// [`crate::validate`]; this only guards against manifests that could
    /// never be dispatched correctly.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("manifest name must not be empty");
        }
        let mut seen = HashSet::new();
        for function in &self.functions {
            if function.name.trim().is_empty() {
                bail!("function name must not be empty");
            }
            if !seen.insert(function.name.as_str()) {
                bail!("duplicate function name '{}'", function.name);
            }
            for (param_name, param) in &function.parameters {
                if param.kind == ParamType::Enum
                    && param.allowed.as_ref().map_or(true, |v| v.is_empty())
                {
                    bail!(
                        "enum parameter '{}' of '{}' must declare allowed values",
                        param_name,
                        function.name
                    );
                }
                if let (Some(min), Some(max)) = (param.min, param.max) {
                    if min > max {
                        bail!(
                            "parameter '{}' of '{}' has min {} greater than max {}",
                            param_name,
                            function.name,
                            min,
                            max
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Parses a manifest out of the raw JSON stored on a plugin record.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }
}

impl TryFrom<&Value> for SkillManifest {
    type Error = serde_json::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        if !value.is_object() {
            return Err(serde_json::Error::custom("manifest must be a JSON object"));
        }
        Self::from_value(value)
    }
}
