use chrono::{DateTime, Utc};
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::OptionItem;

const ID_WIDTH: usize = 12;
const SUMMARY_WIDTH: usize = 52;
const STATUS_WIDTH: usize = 10;
const DATE_WIDTH: usize = 12;

/// Fields tried in order for the summary column.
const SUMMARY_FIELDS: &[&str] = &["subject", "name", "email", "event", "url", "error"];

pub fn format_records(records: &[Value]) -> String {
    if records.is_empty() {
        return "No records.".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<id$}  {:<summary$}  {:<status$}  {:<date$}\n",
        "ID",
        "Summary",
        "Status",
        "Updated",
        id = ID_WIDTH,
        summary = SUMMARY_WIDTH,
        status = STATUS_WIDTH,
        date = DATE_WIDTH
    ));
    out.push_str(&format!(
        "{}  {}  {}  {}\n",
        "-".repeat(ID_WIDTH),
        "-".repeat(SUMMARY_WIDTH),
        "-".repeat(STATUS_WIDTH),
        "-".repeat(DATE_WIDTH)
    ));

    for record in records {
        let id = field_text(record, "id").unwrap_or_else(|| "-".to_string());
        let summary = SUMMARY_FIELDS
            .iter()
            .find_map(|key| field_text(record, key))
            .unwrap_or_else(|| "(no summary)".to_string());
        let status = field_text(record, "status")
            .or_else(|| field_text(record, "success").map(|ok| format!("success={ok}")))
            .unwrap_or_else(|| "-".to_string());
        let updated = field_text(record, "userUpdatedAt")
            .or_else(|| field_text(record, "updatedAt"))
            .or_else(|| field_text(record, "createdAt"))
            .or_else(|| field_text(record, "timestamp"))
            .map(|raw| relative_date(&raw))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!(
            "{:<id_w$}  {:<summary_w$}  {:<status_w$}  {:<date_w$}\n",
            truncate_for_width(&id, ID_WIDTH),
            truncate_for_width(&summary, SUMMARY_WIDTH),
            truncate_for_width(&status, STATUS_WIDTH),
            truncate_for_width(&updated, DATE_WIDTH),
            id_w = ID_WIDTH,
            summary_w = SUMMARY_WIDTH,
            status_w = STATUS_WIDTH,
            date_w = DATE_WIDTH
        ));
    }

    out
}

pub fn format_options(options: &[OptionItem]) -> String {
    if options.is_empty() {
        return "No options.".to_string();
    }

    let mut out = String::new();
    out.push_str("Value         Name\n");
    out.push_str("------------  ----------------------------------------\n");
    for option in options {
        let value = match &option.value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        out.push_str(&format!(
            "{:<12}  {}\n",
            truncate_for_width(&value, 12),
            truncate_for_width(&option.name, 40)
        ));
    }
    out
}

/// `key: value` lines for a single object; anything else is printed as JSON.
pub fn format_value(value: &Value) -> String {
    let Value::Object(map) = value else {
        return value.to_string();
    };

    let mut out = String::new();
    for (key, field) in map {
        let rendered = match field {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        out.push_str(&format!("{key}: {rendered}\n"));
    }
    out
}

fn field_text(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Object(_) | Value::Array(_) => None,
        other => Some(other.to_string()),
    }
}

fn relative_date(input: &str) -> String {
    let parsed = match DateTime::parse_from_rfc3339(input) {
        Ok(value) => value.with_timezone(&Utc),
        Err(_) => return input.to_string(),
    };

    let delta = Utc::now().signed_duration_since(parsed);
    if delta.num_seconds() < 0 {
        return "in future".to_string();
    }
    if delta.num_minutes() < 1 {
        return "just now".to_string();
    }
    if delta.num_hours() < 1 {
        return format!("{}m ago", delta.num_minutes());
    }
    if delta.num_hours() < 24 {
        return format!("{}h ago", delta.num_hours());
    }
    if delta.num_days() == 1 {
        return "yesterday".to_string();
    }
    if delta.num_days() < 7 {
        return format!("{}d ago", delta.num_days());
    }
    parsed.format("%Y-%m-%d").to_string()
}

fn truncate_for_width(value: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(value) <= max_width {
        return value.to_string();
    }

    if max_width <= 1 {
        return "…".to_string();
    }

    let mut out = String::new();
    let mut width = 0usize;
    for c in value.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            break;
        }
        out.push(c);
        width += cw;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::{format_options, format_records, format_value, truncate_for_width};
    use crate::models::OptionItem;

    #[test]
    fn records_table_has_headers_and_summary() {
        let rendered = format_records(&[json!({
            "id": 1234,
            "subject": "A very long subject line that should be truncated in table output",
            "status": "active",
            "createdAt": (Utc::now() - Duration::hours(2)).to_rfc3339()
        })]);
        assert!(rendered.contains("Summary"));
        assert!(rendered.contains("1234"));
        assert!(rendered.contains("active"));
        assert!(rendered.contains("2h ago"));
        assert!(rendered.contains('…'));
    }

    #[test]
    fn acknowledgement_records_show_success() {
        let rendered = format_records(&[json!({"success": true, "conversationId": 9})]);
        assert!(rendered.contains("success=true"));
        assert_eq!(format_records(&[]), "No records.");
    }

    #[test]
    fn options_table_lists_values() {
        let rendered = format_options(&[OptionItem {
            name: "Support".to_string(),
            value: json!(42),
        }]);
        assert!(rendered.contains("42"));
        assert!(rendered.contains("Support"));
    }

    #[test]
    fn single_value_renders_key_lines() {
        assert_eq!(format_value(&json!({"exists": true})), "exists: true\n");
    }

    #[test]
    fn truncation_counts_display_width() {
        assert_eq!(truncate_for_width("日本語テキスト", 6), "日本…");
        assert_eq!(truncate_for_width("short", 10), "short");
    }
}
