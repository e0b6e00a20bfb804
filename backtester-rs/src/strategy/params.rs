//! Strategy parameter schemas and validation

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::strategy::StrategyError;

/// Resolved or user-supplied strategy parameters
pub type StrategyParams = BTreeMap<String, Value>;

/// Value type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Int,
    Float,
}

/// Declaration of one tunable parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub description: &'static str,
}

impl ParamSpec {
    /// Integer parameter with a default and inclusive bounds
    pub fn int(name: &'static str, default: i64, min: i64, max: i64, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Int,
            default: Some(Value::from(default)),
            min: Some(min as f64),
            max: Some(max as f64),
            description,
        }
    }

    /// Float parameter with a default and inclusive bounds
    pub fn float(name: &'static str, default: f64, min: f64, max: f64, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Float,
            default: Some(Value::from(default)),
            min: Some(min),
            max: Some(max),
            description,
        }
    }

    fn check(&self, value: &Value) -> Result<(), StrategyError> {
        let numeric = match self.kind {
            ParamKind::Int if value.is_i64() || value.is_u64() => value.as_f64(),
            ParamKind::Float => value.as_f64(),
            _ => None,
        };
        let Some(number) = numeric else {
            return Err(StrategyError::InvalidParamType {
                name: self.name.to_string(),
                expected: self.kind,
            });
        };

        let below = self.min.is_some_and(|min| number < min);
        let above = self.max.is_some_and(|max| number > max);
        if below || above {
            return Err(StrategyError::OutOfRange {
                name: self.name.to_string(),
                value: number,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Ordered parameter declarations for a strategy
pub type ParamSchema = Vec<ParamSpec>;

/// Defaults for every parameter that declares one
pub fn default_params(schema: &[ParamSpec]) -> StrategyParams {
    schema
        .iter()
        .filter_map(|spec| spec.default.clone().map(|d| (spec.name.to_string(), d)))
        .collect()
}

/// Check `params` against `schema` and fill in defaults.
///
/// Unknown keys are rejected so typos don't silently fall back to defaults.
pub fn validate_params(
    schema: &[ParamSpec],
    params: &StrategyParams,
) -> Result<StrategyParams, StrategyError> {
    if let Some(unknown) = params
        .keys()
        .find(|key| !schema.iter().any(|spec| spec.name == key.as_str()))
    {
        return Err(StrategyError::UnknownParam(unknown.clone()));
    }

    let mut resolved = StrategyParams::new();
    for spec in schema {
        let value = match (params.get(spec.name), &spec.default) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.clone(),
            (None, None) => return Err(StrategyError::MissingParam(spec.name.to_string())),
        };
        spec.check(&value)?;
        resolved.insert(spec.name.to_string(), value);
    }
    Ok(resolved)
}

/// Read a validated integer parameter
pub fn int_param(params: &StrategyParams, name: &str) -> Result<i64, StrategyError> {
    params
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| StrategyError::MissingParam(name.to_string()))
}
