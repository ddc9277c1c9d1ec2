//! Parameter resolution
//!
//! Turns a template's declared parameters plus caller overrides into the flat
//! key/value map handed to the renderer.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::claim_template::{ClaimTemplate, ParamType, Parameter};

/// Resolved render inputs, ordered by key
pub type ParamMap = BTreeMap<String, Value>;

/// Value that asks for a random enum member on `allowRandom` parameters.
pub const RANDOM_MARKER: &str = "random";

/// Default for one parameter: the declared default, else the type's zero value.
pub fn default_value(param: &Parameter) -> Value {
    if let Some(default) = &param.default {
        return default.clone();
    }
    match param.param_type {
        ParamType::String => json!(""),
        ParamType::Boolean => json!(false),
        ParamType::Number => json!(0),
        ParamType::Array => json!([]),
        ParamType::Other(_) => Value::Null,
    }
}

/// Defaults for every declared parameter.
pub fn build_parameter_values(template: &ClaimTemplate) -> ParamMap {
    template
        .spec
        .parameters
        .iter()
        .map(|p| (p.name.clone(), default_value(p)))
        .collect()
}

/// Apply `overrides` on top of `defaults`; overrides win.
pub fn merge_overrides(mut defaults: ParamMap, overrides: &ParamMap) -> ParamMap {
    for (key, value) in overrides {
        defaults.insert(key.clone(), value.clone());
    }
    defaults
}

/// Defaults for `template` with optional caller overrides applied.
///
/// Override keys the template does not declare are passed through.
pub fn resolve_parameters(template: &ClaimTemplate, overrides: Option<&ParamMap>) -> ParamMap {
    let defaults = build_parameter_values(template);
    let Some(overrides) = overrides else {
        return defaults;
    };

    for key in overrides.keys() {
        if template.parameter(key).is_none() {
            debug!(
                "Passing undeclared parameter '{}' through for template '{}'",
                key,
                template.name()
            );
        }
    }
    merge_overrides(defaults, overrides)
}

/// Replace `random` values with a random enum member where allowed.
pub fn apply_random_choices<R: Rng + ?Sized>(
    template: &ClaimTemplate,
    params: &mut ParamMap,
    rng: &mut R,
) {
    for param in &template.spec.parameters {
        if !param.allow_random {
            continue;
        }
        let Some(value) = params.get_mut(&param.name) else {
            continue;
        };
        if value.as_str() != Some(RANDOM_MARKER) {
            continue;
        }
        if let Some(choice) = param.enum_values.choose(rng) {
            debug!("Random selection for {}: {}", param.name, choice);
            *value = Value::String(choice.clone());
        }
    }
}

/// Text form of a value as passed to the renderer.
///
/// Strings are verbatim, null is empty. Arrays and objects are compact JSON
/// (`["a",1]`, not a space-separated listing) so KCL can parse them back.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Convert every value to a string value.
pub fn stringify_values(params: &ParamMap) -> ParamMap {
    params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(value_to_string(v))))
        .collect()
}

/// A resolved value that breaks a parameter's declared constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterViolation {
    pub parameter: String,
    pub message: String,
}

/// Check resolved values against required, enum, pattern and length rules.
///
/// Advisory: rendering does not depend on the result.
pub fn validate_parameters(template: &ClaimTemplate, params: &ParamMap) -> Vec<ParameterViolation> {
    let mut violations = Vec::new();
    let mut violate = |param: &Parameter, message: String| {
        violations.push(ParameterViolation {
            parameter: param.name.clone(),
            message,
        })
    };

    for param in &template.spec.parameters {
        let value = params.get(&param.name).unwrap_or(&Value::Null);
        let is_blank = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };

        if is_blank {
            if param.required {
                violate(param, "required".into());
            }
            continue;
        }

        let text = value_to_string(value);

        if !param.enum_values.is_empty() && !param.enum_values.contains(&text) {
            violate(
                param,
                format!("'{}' is not one of [{}]", text, param.enum_values.join(", ")),
            );
        }

        let Value::String(s) = value else {
            continue;
        };

        if let Some(pattern) = &param.pattern {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    violate(param, format!("'{}' does not match pattern {}", s, pattern))
                }
                Ok(_) => {}
                Err(e) => violate(param, format!("invalid pattern {}: {}", pattern, e)),
            }
        }

        let len = s.chars().count();
        if let Some(min) = param.min_length {
            if len < min {
                violate(param, format!("length {} is below minimum {}", len, min));
            }
        }
        if let Some(max) = param.max_length {
            if len > max {
                violate(param, format!("length {} exceeds maximum {}", len, max));
            }
        }
    }

    violations
}
