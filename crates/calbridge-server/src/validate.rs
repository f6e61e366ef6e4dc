//! Request parameter validation.
//!
//! Checks run against the raw JSON object in a fixed order, and the first
//! failing field is the one named in the error. Required fields must be
//! non-empty strings (absent, null, `""`, and any other JSON type all fail
//! the same way); update's `summary`/`location`/`description` only require
//! the key to be present, so a caller can blank a field by sending null or
//! an empty string.

use serde_json::{Map, Value};

use calbridge_providers::{SyncError, SyncResult};

fn has_text(params: &Map<String, Value>, key: &str) -> bool {
    matches!(params.get(key), Some(Value::String(s)) if !s.is_empty())
}

fn check_attendees_shape(params: &Map<String, Value>) -> SyncResult<()> {
    match params.get("attendees") {
        None | Some(Value::Null) | Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(SyncError::missing_parameter("array of attendees")),
    }
}

/// Validates create (POST) parameters.
pub fn check_create(params: &Map<String, Value>) -> SyncResult<()> {
    for field in ["srcType", "srcAccountName", "dtstart", "dtend"] {
        if !has_text(params, field) {
            return Err(SyncError::missing_parameter(field));
        }
    }
    check_attendees_shape(params)
}

/// Validates update (PUT) parameters.
pub fn check_update(params: &Map<String, Value>) -> SyncResult<()> {
    for field in ["id", "dtstart", "dtend"] {
        if !has_text(params, field) {
            return Err(SyncError::missing_parameter(field));
        }
    }
    for field in ["summary", "location", "description"] {
        if !params.contains_key(field) {
            return Err(SyncError::missing_parameter(field));
        }
    }
    check_attendees_shape(params)
}

/// Validates delete (DELETE) parameters.
pub fn check_delete(params: &Map<String, Value>) -> SyncResult<()> {
    if !has_text(params, "id") {
        return Err(SyncError::missing_parameter("id"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(json: &str) -> Map<String, Value> {
        match serde_json::from_str(json).unwrap() {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn create_reports_first_missing_field() {
        let err = check_create(&object(r#"{"srcAccountName": "a"}"#)).unwrap_err();
        assert_eq!(err.message(), "missing required(srcType) parameter.");

        let err = check_create(&object(r#"{"srcType": "Google"}"#)).unwrap_err();
        assert_eq!(err.message(), "missing required(srcAccountName) parameter.");

        let err = check_create(&object(
            r#"{"srcType": "Google", "srcAccountName": "a", "dtstart": "x"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.message(), "missing required(dtend) parameter.");
    }

    #[test]
    fn create_empty_string_counts_as_missing() {
        let err = check_create(&object(
            r#"{"srcType": "", "srcAccountName": "a", "dtstart": "x", "dtend": "y"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.message(), "missing required(srcType) parameter.");
    }

    #[test]
    fn create_non_string_required_field_is_named() {
        let err = check_create(&object(
            r#"{"srcType": "Google", "srcAccountName": "a", "dtstart": 123, "dtend": "y"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.message(), "missing required(dtstart) parameter.");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn create_non_array_attendees_is_rejected() {
        let err = check_create(&object(
            r#"{"srcType": "Google", "srcAccountName": "a", "dtstart": "x",
                "dtend": "y", "attendees": "bob@example.com"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.message(), "missing required(array of attendees) parameter.");
    }

    #[test]
    fn create_empty_string_attendees_is_rejected() {
        let err = check_create(&object(
            r#"{"srcType": "Google", "srcAccountName": "a", "dtstart": "x",
                "dtend": "y", "attendees": ""}"#,
        ))
        .unwrap_err();
        assert_eq!(err.message(), "missing required(array of attendees) parameter.");
    }

    #[test]
    fn update_non_array_attendees_is_rejected() {
        let err = check_update(&object(
            r#"{"id": "ev-1", "dtstart": "x", "dtend": "y",
                "summary": null, "location": null, "description": null,
                "attendees": "bob@example.com"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.message(), "missing required(array of attendees) parameter.");
    }

    #[test]
    fn create_with_array_attendees_passes() {
        check_create(&object(
            r#"{"srcType": "Google", "srcAccountName": "a", "dtstart": "x",
                "dtend": "y", "attendees": ["bob@example.com"]}"#,
        ))
        .unwrap();
    }

    #[test]
    fn update_requires_presence_of_blankable_keys() {
        let err = check_update(&object(
            r#"{"id": "ev-1", "dtstart": "x", "dtend": "y"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.message(), "missing required(summary) parameter.");
    }

    #[test]
    fn update_accepts_null_and_empty_blankable_keys() {
        check_update(&object(
            r#"{"id": "ev-1", "dtstart": "x", "dtend": "y",
                "summary": null, "location": "", "description": null}"#,
        ))
        .unwrap();
    }

    #[test]
    fn update_requires_id_first() {
        let err = check_update(&object(r#"{"dtstart": "x", "dtend": "y"}"#)).unwrap_err();
        assert_eq!(err.message(), "missing required(id) parameter.");
    }

    #[test]
    fn delete_requires_id() {
        let err = check_delete(&object(r#"{}"#)).unwrap_err();
        assert_eq!(err.message(), "missing required(id) parameter.");
        check_delete(&object(r#"{"id": "ev-1"}"#)).unwrap();
    }
}
