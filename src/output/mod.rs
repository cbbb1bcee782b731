pub mod json;
pub mod table;

use anyhow::Result;
use serde_json::Value;

use crate::models::OptionItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Table
        }
    }
}

pub fn format_records(format: OutputFormat, records: &[Value]) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_records(records)),
        OutputFormat::Json => json::format_records(records),
    }
}

pub fn format_options(format: OutputFormat, options: &[OptionItem]) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_options(options)),
        OutputFormat::Json => json::format_options(options),
    }
}

pub fn format_value(format: OutputFormat, value: &Value) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_value(value)),
        OutputFormat::Json => json::format_value(value),
    }
}
