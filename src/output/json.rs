use anyhow::Result;
use serde_json::Value;

use crate::models::OptionItem;

pub fn format_records(records: &[Value]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn format_options(options: &[OptionItem]) -> Result<String> {
    Ok(serde_json::to_string_pretty(options)?)
}

pub fn format_value(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
