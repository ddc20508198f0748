//! Field-by-field validation of the model's JSON output.
//!
//! The model is non-deterministic, so nothing here repairs or clamps: a value is
//! either accepted as-is (modulo trimming and case-normalizing `action`) or the
//! whole response is rejected with the path of the first offending field.

use crate::domain::recommendation::{Action, InferenceResponse, InvestmentDecision};
use crate::error::SignalError;
use serde_json::{Map, Value};

pub fn validate_response(value: &Value) -> Result<InferenceResponse, SignalError> {
    let root = as_object(value, "$")?;

    let reasoning = required_string(root, "reasoning", "reasoning")?;

    let decisions = match required(root, "investment_decisions", "investment_decisions")? {
        Value::Array(items) => items,
        other => {
            return Err(SignalError::schema(
                "investment_decisions",
                format!("expected array, got {}", type_name(other)),
            ))
        }
    };

    let mut investment_decisions = Vec::with_capacity(decisions.len());
    for (idx, item) in decisions.iter().enumerate() {
        let path = format!("investment_decisions[{idx}]");
        investment_decisions.push(validate_decision(item, &path)?);
    }

    Ok(InferenceResponse {
        reasoning,
        investment_decisions,
    })
}

fn validate_decision(value: &Value, path: &str) -> Result<InvestmentDecision, SignalError> {
    let obj = as_object(value, path)?;

    let asset = required_string(obj, "asset", &format!("{path}.asset"))?;
    if asset.is_empty() {
        return Err(SignalError::schema(
            format!("{path}.asset"),
            "must be non-empty",
        ));
    }

    let action_path = format!("{path}.action");
    let raw_action = required_string(obj, "action", &action_path)?;
    let action = Action::parse(&raw_action).ok_or_else(|| {
        SignalError::schema(
            &action_path,
            format!("expected one of buy|hold|avoid, got {raw_action:?}"),
        )
    })?;

    let confidence_path = format!("{path}.confidence");
    let confidence = coerce_f64(required(obj, "confidence", &confidence_path)?, &confidence_path)?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(SignalError::schema(
            confidence_path,
            format!("must be between 0 and 1 (got {confidence})"),
        ));
    }

    let allocation_path = format!("{path}.allocation_pct");
    let allocation_pct = match obj.get("allocation_pct") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let pct = coerce_f64(v, &allocation_path)?;
            if !(0.0..=100.0).contains(&pct) {
                return Err(SignalError::schema(
                    allocation_path,
                    format!("must be between 0 and 100 (got {pct})"),
                ));
            }
            Some(pct)
        }
    };

    let rationale = required_string(obj, "rationale", &format!("{path}.rationale"))?;
    if rationale.is_empty() {
        return Err(SignalError::schema(
            format!("{path}.rationale"),
            "must be non-empty",
        ));
    }

    Ok(InvestmentDecision {
        asset,
        action,
        confidence,
        allocation_pct,
        rationale,
    })
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SignalError> {
    value.as_object().ok_or_else(|| {
        SignalError::schema(path, format!("expected object, got {}", type_name(value)))
    })
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Value, SignalError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(SignalError::schema(path, "missing required field")),
        Some(v) => Ok(v),
    }
}

fn required_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<String, SignalError> {
    match required(obj, key, path)? {
        Value::String(s) => Ok(s.trim().to_string()),
        other => Err(SignalError::schema(
            path,
            format!("expected string, got {}", type_name(other)),
        )),
    }
}

/// Numbers pass through; numeric strings such as `"0.6"` are accepted too.
fn coerce_f64(value: &Value, path: &str) -> Result<f64, SignalError> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(SignalError::schema(
            path,
            format!("expected number, got {value}"),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
