use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;

use crate::utils::error::AppError;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: 'title' and 'date'";

/// A persisted row of the `events` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub location: Option<String>,
}

/// An event payload carrying both required fields, exactly as the client sent
/// them. Format rules (date syntax, column widths) are left to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub location: Option<String>,
}

impl NewEvent {
    /// Extracts the event fields from a JSON payload.
    ///
    /// Only absent or null `title`/`date` fields, and payloads that are not
    /// JSON objects, are rejected.
    pub fn from_json(payload: &Value) -> Result<Self, AppError> {
        let fields = payload
            .as_object()
            .ok_or_else(|| AppError::ValidationError(MISSING_FIELDS_MESSAGE.to_string()))?;

        let (Some(title), Some(date)) = (present(fields, "title"), present(fields, "date")) else {
            return Err(AppError::ValidationError(MISSING_FIELDS_MESSAGE.to_string()));
        };

        Ok(Self {
            title: text(title),
            description: present(fields, "description").map(text),
            date: text(date),
            location: present(fields, "location").map(text),
        })
    }

    /// Parses `date` as a `YYYY-MM-DD` calendar date.
    pub fn parse_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

fn present<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(name).filter(|value| !value.is_null())
}

/// Strings pass through untouched; other JSON values keep their JSON text.
fn text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validation_message(payload: Value) -> String {
        match NewEvent::from_json(&payload) {
            Err(AppError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_minimal_payload() {
        let event = NewEvent::from_json(&json!({"title": "Launch", "date": "2024-01-01"})).unwrap();

        assert_eq!(event.title, "Launch");
        assert_eq!(event.parse_date(), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(event.description, None);
        assert_eq!(event.location, None);
    }

    #[test]
    fn test_full_payload() {
        let event = NewEvent::from_json(&json!({
            "title": "Meetup",
            "date": "2024-02-29",
            "description": "Rust evening",
            "location": "Berlin"
        }))
        .unwrap();

        assert_eq!(event.description.as_deref(), Some("Rust evening"));
        assert_eq!(event.location.as_deref(), Some("Berlin"));
    }

    #[test]
    fn test_missing_required_fields() {
        for payload in [
            json!({"date": "2024-01-01"}),
            json!({"title": "Launch"}),
            json!({"title": null, "date": "2024-01-01"}),
            json!({"title": "x", "date": null}),
            json!({}),
            json!(null),
            json!(["title", "date"]),
        ] {
            assert_eq!(validation_message(payload), MISSING_FIELDS_MESSAGE);
        }
    }

    #[test]
    fn test_malformed_present_fields_are_kept() {
        let event = NewEvent::from_json(&json!({"title": "", "date": "tomorrow"})).unwrap();
        assert_eq!(event.title, "");
        assert_eq!(event.date, "tomorrow");
        assert_eq!(event.parse_date(), None);

        let event =
            NewEvent::from_json(&json!({"title": 7, "date": "2024-01-01", "location": true}))
                .unwrap();
        assert_eq!(event.title, "7");
        assert_eq!(event.location.as_deref(), Some("true"));
    }

    #[test]
    fn test_text_is_not_trimmed() {
        let event = NewEvent::from_json(&json!({
            "title": "  Launch ",
            "date": "2024-01-01",
            "description": " padded "
        }))
        .unwrap();

        assert_eq!(event.title, "  Launch ");
        assert_eq!(event.description.as_deref(), Some(" padded "));
    }

    #[test]
    fn test_event_serializes_date_as_iso() {
        let event = Event {
            id: 1,
            title: "Launch".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            location: None,
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "id": 1,
                "title": "Launch",
                "description": null,
                "date": "2024-01-01",
                "location": null
            })
        );
    }
}
