//! Response parsing — turns raw model text into typed records.
//!
//! The two parsers deliberately differ on bad input. `parse_names` never fails
//! and degrades to an empty list. `parse_grade_records` reports
//! `MalformedResponse`, so callers can tell "no grades" from "unusable reply".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::llm_client::strip_json_fences;
use crate::models::score::coerce_score;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// One student's grades as read from an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedGradeRecord {
    pub name: String,
    pub note1: f64,
    pub note2: f64,
    pub note3: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Names
// ────────────────────────────────────────────────────────────────────────────

/// Splits model output into names: one per line, trimmed, blanks and repeats
/// dropped, first-seen order kept.
pub fn parse_names(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in raw.lines() {
        let name = strip_list_marker(line.trim());
        if name.is_empty() || names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
    }
    names
}

/// Removes a leading bullet (`-`, `*`, `•`) or ordinal (`3.`, `3)`) the model
/// may add despite being told not to.
fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line
        .strip_prefix('-')
        .or_else(|| line.strip_prefix('*'))
        .or_else(|| line.strip_prefix('•'))
    {
        return rest.trim_start();
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(after) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if after.starts_with(char::is_whitespace) {
                return after.trim_start();
            }
        }
    }
    line
}

// ────────────────────────────────────────────────────────────────────────────
// Grades
// ────────────────────────────────────────────────────────────────────────────

/// Parses grade records out of model output, tolerating markdown code fences.
///
/// Accepted shapes: an array of records, a single record, or an object whose
/// only array-valued field holds the records. Empty output means the model
/// produced nothing and yields an empty list. Records without a usable name
/// are dropped; scores are coerced to numbers.
pub fn parse_grade_records(raw: &str) -> Result<Vec<ExtractedGradeRecord>, ParseError> {
    let text = strip_json_fences(raw);
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| ParseError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(obj) if obj.contains_key("name") => vec![Value::Object(obj)],
        Value::Object(obj) => single_array_field(obj)?,
        other => {
            return Err(ParseError::MalformedResponse(format!(
                "expected an array of grade records, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let fields = match item {
            Value::Object(fields) => fields,
            other => {
                return Err(ParseError::MalformedResponse(format!(
                    "grade record {index} is {}, not an object",
                    json_kind(&other)
                )))
            }
        };
        match validate_record(&fields) {
            Some(record) => records.push(record),
            None => warn!("Dropping grade record {index}: no student name"),
        }
    }
    Ok(records)
}

fn single_array_field(obj: Map<String, Value>) -> Result<Vec<Value>, ParseError> {
    let mut arrays = obj.into_iter().filter_map(|(_, v)| match v {
        Value::Array(items) => Some(items),
        _ => None,
    });
    match (arrays.next(), arrays.next()) {
        (Some(items), None) => Ok(items),
        _ => Err(ParseError::MalformedResponse(
            "expected an array of grade records, got an object".to_string(),
        )),
    }
}

fn validate_record(fields: &Map<String, Value>) -> Option<ExtractedGradeRecord> {
    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())?;

    let score = |key: &str| fields.get(key).map(coerce_score).unwrap_or(0.0);

    Some(ExtractedGradeRecord {
        name: name.to_string(),
        note1: score("note1"),
        note2: score("note2"),
        note3: score("note3"),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, n1: f64, n2: f64, n3: f64) -> ExtractedGradeRecord {
        ExtractedGradeRecord {
            name: name.to_string(),
            note1: n1,
            note2: n2,
            note3: n3,
        }
    }

    // ── names ──────────────────────────────────────────────────────────────

    #[test]
    fn test_names_drop_blank_lines() {
        assert_eq!(
            parse_names("Alice Smith\n\nBob Jones\n  \n"),
            vec!["Alice Smith", "Bob Jones"]
        );
    }

    #[test]
    fn test_names_trim_and_handle_crlf() {
        assert_eq!(
            parse_names("  Alice Smith \r\n\tBob Jones\r\n"),
            vec!["Alice Smith", "Bob Jones"]
        );
    }

    #[test]
    fn test_names_drop_duplicates_keep_order() {
        assert_eq!(
            parse_names("Zoe\nAdam\nZoe\nAdam\nMia"),
            vec!["Zoe", "Adam", "Mia"]
        );
    }

    #[test]
    fn test_names_strip_list_markers() {
        assert_eq!(
            parse_names("1. Alice\n2) Bob\n- Carol\n* Dan\n• Eve"),
            vec!["Alice", "Bob", "Carol", "Dan", "Eve"]
        );
    }

    #[test]
    fn test_names_keep_digits_that_are_not_markers() {
        assert_eq!(parse_names("Louis 14\n3.5"), vec!["Louis 14", "3.5"]);
    }

    #[test]
    fn test_names_empty_or_garbage_input() {
        assert!(parse_names("").is_empty());
        assert!(parse_names("\n \n\t\n").is_empty());
        assert!(parse_names("-\n*\n").is_empty());
    }

    // ── grades ─────────────────────────────────────────────────────────────

    #[test]
    fn test_grades_fenced_array() {
        let raw = "```json\n[{\"name\":\"A\",\"note1\":1,\"note2\":2,\"note3\":3}]\n```";
        assert_eq!(parse_grade_records(raw).unwrap(), vec![record("A", 1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_grades_bare_array() {
        let raw = r#"[
            {"name": "Alice", "note1": 12, "note2": 15.5, "note3": 18},
            {"name": "Bob", "note1": 9, "note2": 11, "note3": 10}
        ]"#;
        let records = parse_grade_records(raw).unwrap();
        assert_eq!(
            records,
            vec![record("Alice", 12.0, 15.5, 18.0), record("Bob", 9.0, 11.0, 10.0)]
        );
    }

    #[test]
    fn test_grades_invalid_json_is_malformed() {
        let err = parse_grade_records("```json\n[{\"name\": \"A\", \n```").unwrap_err();
        assert!(matches!(err, ParseError::MalformedResponse(_)));
    }

    #[test]
    fn test_grades_prose_is_malformed_not_empty() {
        assert!(parse_grade_records("I could not read the image.").is_err());
    }

    #[test]
    fn test_grades_scalar_is_malformed() {
        assert!(parse_grade_records("42").is_err());
        assert!(parse_grade_records("[1, 2]").is_err());
    }

    #[test]
    fn test_grades_empty_output_is_empty_list() {
        assert!(parse_grade_records("").unwrap().is_empty());
        assert!(parse_grade_records("```json\n```").unwrap().is_empty());
        assert!(parse_grade_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_grades_single_object() {
        let raw = r#"{"name": "Solo", "note1": 10, "note2": 10, "note3": 10}"#;
        assert_eq!(
            parse_grade_records(raw).unwrap(),
            vec![record("Solo", 10.0, 10.0, 10.0)]
        );
    }

    #[test]
    fn test_grades_wrapped_in_object() {
        let raw = r#"{"students": [{"name": "W", "note1": 1, "note2": 1, "note3": 1}]}"#;
        assert_eq!(parse_grade_records(raw).unwrap(), vec![record("W", 1.0, 1.0, 1.0)]);
    }

    #[test]
    fn test_grades_ambiguous_object_is_malformed() {
        let raw = r#"{"a": [], "b": []}"#;
        assert!(parse_grade_records(raw).is_err());
    }

    #[test]
    fn test_grades_coerce_scores() {
        let raw = r#"[{"name": " Ada ", "note1": "14,5", "note2": "absent", "note3": null}]"#;
        assert_eq!(parse_grade_records(raw).unwrap(), vec![record("Ada", 14.5, 0.0, 0.0)]);
    }

    #[test]
    fn test_grades_missing_scores_default_to_zero() {
        let raw = r#"[{"name": "Ada"}]"#;
        assert_eq!(parse_grade_records(raw).unwrap(), vec![record("Ada", 0.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_grades_records_without_name_are_rejected() {
        let raw = r#"[
            {"note1": 1, "note2": 2, "note3": 3},
            {"name": "   ", "note1": 1, "note2": 2, "note3": 3},
            {"name": 7, "note1": 1, "note2": 2, "note3": 3},
            {"name": "Kept", "note1": 1, "note2": 2, "note3": 3}
        ]"#;
        assert_eq!(parse_grade_records(raw).unwrap(), vec![record("Kept", 1.0, 2.0, 3.0)]);
    }
}
