//! Score coercion shared by the student model, the edit payloads and the
//! grade-record parser. Anything that is not a finite number becomes 0.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerces a loosely-typed JSON value into a score.
///
/// Numbers pass through, numeric strings (including a comma decimal separator)
/// are parsed, everything else is 0. Non-finite results are 0 as well.
pub fn coerce_score(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Serde adapter for score fields. Pair with `#[serde(default)]` so absent
/// fields also land on 0.
pub fn deserialize_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_score).unwrap_or(0.0))
}

/// Serde adapter for optional score fields in partial edits: absent stays
/// `None`, present-but-garbage becomes `Some(0.0)`.
pub fn deserialize_optional_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(Some(value.as_ref().map(coerce_score).unwrap_or(0.0)))
}
