//! Call-argument validation against a function's parameter schema.
//!
//! Validation never short-circuits: every declared parameter is checked and
//! every problem is reported, so a caller fixing a bad request sees the full
//! list at once instead of one violation per attempt. Arguments that are not
//! declared in the schema are ignored.

use std::fmt;

use serde_json::{Map, Value};

use crate::manifest::{FunctionDef, ParamDef, ParamType};

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// A single schema violation found while validating call arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub parameter: String,
    pub message: String,
}

impl Violation {
    fn new(parameter: &str, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parameter '{}': {}", self.parameter, self.message)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Checks `args` against the parameter schema of `def`.
///
/// Returns every violation found. `Value::Null` counts as missing, which
/// means a required parameter set to `null` fails the same way as one that
/// was never sent.
pub fn validate_call(def: &FunctionDef, args: &Map<String, Value>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (name, param) in &def.parameters {
        match args.get(name) {
            None | Some(Value::Null) => {
                if param.required {
                    violations.push(Violation::new(name, "required parameter is missing"));
                }
            }
            Some(value) => check_value(name, param, value, &mut violations),
        }
    }
    violations
}

/// Returns a copy of `args` with schema defaults filled in for parameters
/// that are absent or `null`. Runs after validation so defaults are never
/// themselves re-checked.
pub fn apply_defaults(def: &FunctionDef, args: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = args.clone();
    for (name, param) in &def.parameters {
        let missing = matches!(merged.get(name), None | Some(Value::Null));
        if missing {
            if let Some(default) = &param.default {
                merged.insert(name.clone(), default.clone());
            }
        }
    }
    merged
}

fn check_value(name: &str, param: &ParamDef, value: &Value, violations: &mut Vec<Violation>) {
    let expected = param.kind.as_str();
    match param.kind {
        ParamType::String => {
            if !value.is_string() {
                violations.push(type_mismatch(name, expected, value));
            }
        }
        ParamType::Number => match value.as_f64() {
            Some(number) => check_bounds(name, param, number, violations),
            None => violations.push(type_mismatch(name, expected, value)),
        },
        ParamType::Boolean => {
            if !value.is_boolean() {
                violations.push(type_mismatch(name, expected, value));
            }
        }
        ParamType::Array => {
            if !value.is_array() {
                violations.push(type_mismatch(name, expected, value));
            }
        }
        ParamType::Object => {
            if !value.is_object() {
                violations.push(type_mismatch(name, expected, value));
            }
        }
        // An enum value is a string on the wire, so the type error names
        // "string" rather than "enum".
        ParamType::Enum => match value.as_str() {
            Some(text) => {
                let allowed = param.allowed.as_deref().unwrap_or(&[]);
                if !allowed.iter().any(|candidate| candidate == text) {
                    violations.push(Violation::new(
                        name,
                        format!("must be one of [{}], got '{}'", allowed.join(", "), text),
                    ));
                }
            }
            None => violations.push(type_mismatch(name, "string", value)),
        },
    }
}

fn check_bounds(name: &str, param: &ParamDef, number: f64, violations: &mut Vec<Violation>) {
    if let Some(min) = param.min {
        if number < min {
            violations.push(Violation::new(name, format!("must be >= {min}")));
        }
    }
    if let Some(max) = param.max {
        if number > max {
            violations.push(Violation::new(name, format!("must be <= {max}")));
        }
    }
}

fn type_mismatch(name: &str, expected: &str, value: &Value) -> Violation {
    Violation::new(
        name,
        format!("expected {expected}, got {}", json_type_name(value)),
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
