use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::params::is_truthy;

/// Top-level payload sections copied first, in this order, when present.
const PROJECTED_FIELDS: &[&str] = &[
    "conversation",
    "customer",
    "thread",
    "user",
    "mailbox",
    "rating",
    "tags",
];

/// Builds the normalized event record for one delivery.
///
/// `event` falls back to `"unknown"` and `timestamp` is always the receipt
/// time. Remaining payload keys are folded in without replacing keys that
/// already hold a truthy value.
pub fn normalize_event(payload: Map<String, Value>, received_at: DateTime<Utc>) -> Value {
    let mut record = Map::new();
    let event = payload
        .get("event")
        .filter(|value| is_truthy(value))
        .cloned()
        .unwrap_or_else(|| Value::String("unknown".to_string()));
    record.insert("event".to_string(), event);
    record.insert(
        "timestamp".to_string(),
        Value::String(received_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );

    for key in PROJECTED_FIELDS {
        if let Some(value) = payload.get(*key).filter(|value| is_truthy(value)) {
            record.insert((*key).to_string(), value.clone());
        }
    }

    for (key, value) in payload {
        let occupied = record.get(&key).is_some_and(is_truthy);
        if !occupied {
            record.insert(key, value);
        }
    }

    Value::Object(record)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    use super::normalize_event;

    fn payload(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().expect("object payload")
    }

    #[test]
    fn projects_known_sections_and_folds_extras() {
        let received_at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let record = normalize_event(
            payload(json!({
                "event": "convo.assigned",
                "conversation": {"id": 10},
                "rating": null,
                "timestamp": "2001-01-01T00:00:00Z",
                "extra": {"k": "v"}
            })),
            received_at,
        );

        assert_eq!(record["event"], json!("convo.assigned"));
        assert_eq!(record["timestamp"], json!("2026-03-04T05:06:07.000Z"));
        assert_eq!(record["conversation"], json!({"id": 10}));
        assert_eq!(record["extra"], json!({"k": "v"}));
        // falsy projected keys are still folded in as-is
        assert_eq!(record["rating"], Value::Null);
    }

    #[test]
    fn missing_or_empty_event_is_unknown() {
        let now = Utc::now();
        let missing = normalize_event(payload(json!({"customer": {"id": 1}})), now);
        assert_eq!(missing["event"], json!("unknown"));

        let empty = normalize_event(payload(json!({"event": ""})), now);
        assert_eq!(empty["event"], json!("unknown"));
    }
}
