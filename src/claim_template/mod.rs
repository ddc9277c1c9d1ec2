//! Claim Template Definition Types
//!
//! YAML schema for claim templates: a named reference to a renderable
//! artifact plus the parameters a caller may supply when ordering it.

pub mod loader;

pub use loader::{load_all_templates, load_claim_template, parse_claim_template};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// API version used by list and order responses.
pub const API_VERSION: &str = "api.claim-machinery.io/v1alpha1";

/// A complete claim template loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTemplate {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ClaimTemplateMetadata,
    #[serde(default)]
    pub spec: ClaimTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimTemplateMetadata {
    /// Catalog key
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimTemplateSpec {
    #[serde(rename = "type", default)]
    pub template_type: String,

    /// Renderer artifact reference (e.g. `oci://ghcr.io/...`)
    #[serde(default)]
    pub source: String,

    /// Optional version qualifier passed as `--tag`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Parameter definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(rename = "type", default)]
    pub param_type: ParamType,

    /// Declared default, checked against `param_type` by [`ClaimTemplate::validate`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,

    // Validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Hidden parameters keep their default in interactive flows
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,

    /// Allows the `random` marker to pick an enum member
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_random: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Declared parameter type
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamType {
    #[default]
    String,
    Boolean,
    Number,
    Array,
    /// Any type name the catalog does not interpret
    Other(String),
}

impl ParamType {
    pub fn as_str(&self) -> &str {
        match self {
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
            ParamType::Number => "number",
            ParamType::Array => "array",
            ParamType::Other(name) => name,
        }
    }
}

impl From<String> for ParamType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "string" => ParamType::String,
            "boolean" => ParamType::Boolean,
            "number" => ParamType::Number,
            "array" => ParamType::Array,
            _ => ParamType::Other(s),
        }
    }
}

impl From<ParamType> for String {
    fn from(t: ParamType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from template loading.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read template '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid template '{path}': {reason}")]
    InvalidTemplate { path: String, reason: String },
}

impl ClaimTemplate {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.spec.parameters.iter().find(|p| p.name == name)
    }

    /// Check structural invariants and normalize parameter defaults.
    ///
    /// Defaults that can be converted without loss to the declared type are
    /// coerced in place; anything else is rejected.
    pub fn validate(&mut self, origin: &str) -> Result<(), TemplateError> {
        let invalid = |reason: String| TemplateError::InvalidTemplate {
            path: origin.to_string(),
            reason,
        };

        if self.metadata.name.trim().is_empty() {
            return Err(invalid("metadata.name is empty".into()));
        }

        let mut seen = HashSet::new();
        for param in &mut self.spec.parameters {
            if !seen.insert(param.name.clone()) {
                return Err(invalid(format!("duplicate parameter '{}'", param.name)));
            }
            if let Some(default) = param.default.take() {
                let coerced = coerce_default(&param.param_type, default).map_err(|found| {
                    invalid(format!(
                        "default for parameter '{}' is {}, expected {}",
                        param.name, found, param.param_type
                    ))
                })?;
                param.default = Some(coerced);
            }
        }
        Ok(())
    }
}

/// Match a default value against its declared type.
///
/// Returns the (possibly coerced) value, or the name of the offending
/// JSON kind on mismatch.
pub fn coerce_default(param_type: &ParamType, value: Value) -> Result<Value, &'static str> {
    match (param_type, value) {
        (ParamType::Other(_), v) => Ok(v),

        (ParamType::String, v @ Value::String(_)) => Ok(v),
        (ParamType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (ParamType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

        (ParamType::Boolean, v @ Value::Bool(_)) => Ok(v),
        (ParamType::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err("string"),
        },

        (ParamType::Number, v @ Value::Number(_)) => Ok(v),
        (ParamType::Number, Value::String(s)) => {
            serde_json::from_str::<serde_json::Number>(s.trim())
                .map(Value::Number)
                .map_err(|_| "string")
        }

        (ParamType::Array, v @ Value::Array(_)) => Ok(v),

        (_, other) => Err(json_kind(&other)),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_type_round_trips_unknown_names() {
        let t: ParamType = serde_json::from_value(json!("integer")).unwrap();
        assert_eq!(t, ParamType::Other("integer".into()));
        assert_eq!(serde_json::to_value(&t).unwrap(), json!("integer"));

        let t: ParamType = serde_json::from_value(json!("boolean")).unwrap();
        assert_eq!(t, ParamType::Boolean);
    }

    #[test]
    fn matching_defaults_are_kept_verbatim() {
        assert_eq!(
            coerce_default(&ParamType::Array, json!(["a", 1])).unwrap(),
            json!(["a", 1])
        );
        assert_eq!(coerce_default(&ParamType::Number, json!(2.5)).unwrap(), json!(2.5));
        assert_eq!(
            coerce_default(&ParamType::Other("object".into()), json!({"k": "v"})).unwrap(),
            json!({"k": "v"})
        );
    }

    #[test]
    fn lossless_mismatches_are_coerced() {
        assert_eq!(coerce_default(&ParamType::String, json!(3)).unwrap(), json!("3"));
        assert_eq!(coerce_default(&ParamType::String, json!(true)).unwrap(), json!("true"));
        assert_eq!(coerce_default(&ParamType::Number, json!("42")).unwrap(), json!(42));
        assert_eq!(coerce_default(&ParamType::Boolean, json!("false")).unwrap(), json!(false));
    }

    #[test]
    fn lossy_mismatches_are_rejected() {
        assert_eq!(coerce_default(&ParamType::Array, json!("a,b")), Err("string"));
        assert_eq!(coerce_default(&ParamType::Number, json!("ten")), Err("string"));
        assert_eq!(coerce_default(&ParamType::Boolean, json!(1)), Err("number"));
        assert_eq!(coerce_default(&ParamType::String, json!(["x"])), Err("array"));
    }

    fn template_with(params: Vec<Parameter>) -> ClaimTemplate {
        ClaimTemplate {
            api_version: "resources.stuttgart-things.com/v1alpha1".into(),
            kind: "ClaimTemplate".into(),
            metadata: ClaimTemplateMetadata {
                name: "demo".into(),
                ..Default::default()
            },
            spec: ClaimTemplateSpec {
                source: "oci://example/demo".into(),
                parameters: params,
                ..Default::default()
            },
        }
    }

    fn param(name: &str, param_type: ParamType, default: Option<Value>) -> Parameter {
        Parameter {
            name: name.into(),
            title: name.into(),
            description: String::new(),
            param_type,
            default,
            required: false,
            enum_values: vec![],
            pattern: None,
            min_length: None,
            max_length: None,
            hidden: false,
            allow_random: false,
        }
    }

    #[test]
    fn validate_rejects_duplicate_parameters() {
        let mut t = template_with(vec![
            param("size", ParamType::String, None),
            param("size", ParamType::Number, None),
        ]);
        let err = t.validate("demo.yaml").unwrap_err();
        assert!(err.to_string().contains("duplicate parameter 'size'"));
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut t = template_with(vec![]);
        t.metadata.name = "  ".into();
        assert!(matches!(
            t.validate("x.yaml"),
            Err(TemplateError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn validate_coerces_defaults_in_place() {
        let mut t = template_with(vec![param("replicas", ParamType::String, Some(json!(3)))]);
        t.validate("demo.yaml").unwrap();
        assert_eq!(t.parameter("replicas").unwrap().default, Some(json!("3")));
    }
}
