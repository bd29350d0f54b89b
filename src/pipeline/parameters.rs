//! Parameter value validation.
//!
//! Values are checked against the owning spec's `ParameterSpec` before they
//! are merged into a node. The active [`ParameterPolicy`] only changes how
//! out-of-range numbers are handled; every other violation is rejected.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::registry::{NodeSpec, ParameterKind, ParameterSpec};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// How numeric values outside `[min, max]` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterPolicy {
    /// Refuse the whole update, naming the offending parameter.
    #[default]
    Reject,
    /// Pull the value back into range.
    Clamp,
}

impl std::fmt::Display for ParameterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterPolicy::Reject => write!(f, "reject"),
            ParameterPolicy::Clamp => write!(f, "clamp"),
        }
    }
}

/// Check one value, returning the value to store.
pub fn validate_value(
    param: &ParameterSpec,
    value: &Value,
    policy: ParameterPolicy,
) -> PipelineResult<Value> {
    let invalid = |reason: String| PipelineError::InvalidParameter {
        parameter: param.id.clone(),
        reason,
    };
    let validation = param.validation.as_ref();

    match param.kind {
        ParameterKind::Number | ParameterKind::Range => {
            let n = value
                .as_f64()
                .ok_or_else(|| invalid(format!("expected a number, got {}", value)))?;
            let min = validation.and_then(|v| v.min);
            let max = validation.and_then(|v| v.max);
            let below = min.filter(|&min| n < min);
            let above = max.filter(|&max| n > max);
            match (below.or(above), policy) {
                (None, _) => Ok(value.clone()),
                (Some(bound), ParameterPolicy::Clamp) => {
                    tracing::debug!("Clamped parameter '{}' from {} to {}", param.id, n, bound);
                    Ok(Value::from(bound))
                }
                (Some(_), ParameterPolicy::Reject) => Err(invalid(format!(
                    "{} is outside [{}, {}]",
                    n,
                    min.map_or("-inf".to_string(), |m| m.to_string()),
                    max.map_or("inf".to_string(), |m| m.to_string())
                ))),
            }
        }
        ParameterKind::Boolean => {
            if value.is_boolean() {
                Ok(value.clone())
            } else {
                Err(invalid(format!("expected a boolean, got {}", value)))
            }
        }
        ParameterKind::Select => match validation.and_then(|v| v.options.as_ref()) {
            Some(options) if !options.iter().any(|o| &o.value == value) => {
                Err(invalid(format!("{} is not one of the allowed options", value)))
            }
            _ => Ok(value.clone()),
        },
        ParameterKind::String | ParameterKind::File => {
            let s = value
                .as_str()
                .ok_or_else(|| invalid(format!("expected a string, got {}", value)))?;
            if let Some(pattern) = validation.and_then(|v| v.pattern.as_deref()) {
                let re = Regex::new(pattern)
                    .map_err(|e| invalid(format!("pattern '{}' is not valid: {}", pattern, e)))?;
                if !re.is_match(s) {
                    return Err(invalid(format!("'{}' does not match '{}'", s, pattern)));
                }
            }
            Ok(value.clone())
        }
    }
}

/// Check a partial parameter map for a node of `spec`. Fails on the first
/// bad entry; nothing is returned for partial application.
pub fn validate_parameters(
    spec: &NodeSpec,
    partial: &BTreeMap<String, Value>,
    policy: ParameterPolicy,
) -> PipelineResult<BTreeMap<String, Value>> {
    partial
        .iter()
        .map(|(key, value)| {
            let param = spec
                .parameter(key)
                .ok_or_else(|| PipelineError::UnknownParameter {
                    spec_id: spec.id.clone(),
                    parameter: key.clone(),
                })?;
            Ok((key.clone(), validate_value(param, value, policy)?))
        })
        .collect()
}
