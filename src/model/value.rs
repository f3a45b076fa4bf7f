//! Field value rules
//!
//! Blank values (missing, `null`, `false`, `0`, `""`) count as absent for
//! required checks, defaults and the new-record test. Key tokens are the
//! text form of a value inside a store key.

use serde_json::{Number, Value};

use super::errors::{ModelError, ModelResult};
use crate::keys;

/// Whether a field value counts as absent
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f == 0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

/// Key token for `value` of `field`.
///
/// `null` has no token: such values are not indexed and not checked for
/// uniqueness.
pub fn key_token(field: &str, value: &Value) -> ModelResult<Option<String>> {
    let token = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_token(n),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => {
            return Err(ModelError::UnindexableValue(field.to_string()))
        }
    };

    if !keys::is_valid_token(&token) {
        return Err(ModelError::InvalidKeyToken {
            field: field.to_string(),
        });
    }
    Ok(Some(token))
}

/// Integral floats share the integer's token, so `1.0` and `1` index alike.
fn number_token(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}
