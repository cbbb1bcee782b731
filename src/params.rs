use serde_json::{Map, Value};

use crate::error::{ConnectorError, Result};

/// Named parameters for one input item, as resolved by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Map<String, Value>,
}

impl Parameters {
    pub fn new(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(ConnectorError::InvalidParameter(format!(
                "parameters must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The value under `key` when it is truthy (non-empty, non-zero, not false).
    pub fn truthy(&self, key: &str) -> Option<Value> {
        self.values.get(key).filter(|value| is_truthy(value)).cloned()
    }

    pub fn required_string(&self, key: &str) -> Result<String> {
        self.optional_string(key).ok_or_else(|| missing(key))
    }

    pub fn optional_string(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Resource id given either as a JSON number or a numeric string.
    pub fn required_id(&self, key: &str) -> Result<u64> {
        self.optional_id(key)?.ok_or_else(|| missing(key))
    }

    pub fn optional_id(&self, key: &str) -> Result<Option<u64>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
            Some(Value::Number(number)) => number
                .as_u64()
                .map(Some)
                .ok_or_else(|| invalid_id(key)),
            Some(Value::String(raw)) => raw.trim().parse().map(Some).map_err(|_| invalid_id(key)),
            Some(_) => Err(invalid_id(key)),
        }
    }

    pub fn optional_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.optional_bool(key).unwrap_or(default)
    }

    pub fn optional_limit(&self, key: &str) -> Result<Option<usize>> {
        let Some(raw) = self.values.get(key).filter(|value| !value.is_null()) else {
            return Ok(None);
        };

        let value = raw.as_u64().ok_or_else(|| {
            ConnectorError::InvalidParameter(format!("param '{key}' must be a positive integer"))
        })?;
        if value == 0 {
            return Err(ConnectorError::InvalidParameter(format!(
                "param '{key}' must be greater than zero"
            )));
        }
        Ok(Some(value as usize))
    }

    /// Nested option group such as `additionalFields` or `filters`; missing is empty.
    pub fn collection(&self, key: &str) -> Parameters {
        match self.values.get(key) {
            Some(Value::Object(values)) => Self::from_map(values.clone()),
            _ => Self::default(),
        }
    }

    /// Array of strings, or a comma-separated string.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(raw)) => parse_comma_separated(raw),
            _ => Vec::new(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

fn missing(key: &str) -> ConnectorError {
    ConnectorError::InvalidParameter(format!("missing required param '{key}'"))
}

fn invalid_id(key: &str) -> ConnectorError {
    ConnectorError::InvalidParameter(format!("param '{key}' must be a numeric id"))
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Flattens filter values into query pairs. Empty values are dropped and
/// arrays are joined with `,`.
pub fn build_query_params(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut query = Vec::new();
    for (key, value) in params {
        let rendered = match value {
            Value::Null => continue,
            Value::String(text) if text.is_empty() => continue,
            Value::Array(items) if items.is_empty() => continue,
            Value::Array(items) => items.iter().map(scalar_to_string).collect::<Vec<_>>().join(","),
            other => scalar_to_string(other),
        };
        query.push((key.clone(), rendered));
    }
    query
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Recursively drops null and empty-string values. Nested objects that end up
/// empty are dropped, and arrays lose their null entries.
pub fn clean_object(map: Map<String, Value>) -> Map<String, Value> {
    let mut cleaned = Map::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(text) if text.is_empty() => {}
            Value::Object(nested) => {
                let nested = clean_object(nested);
                if !nested.is_empty() {
                    cleaned.insert(key, Value::Object(nested));
                }
            }
            Value::Array(items) => {
                let items: Vec<Value> = items.into_iter().filter(|item| !item.is_null()).collect();
                if !items.is_empty() {
                    cleaned.insert(key, Value::Array(items));
                }
            }
            other => {
                cleaned.insert(key, other);
            }
        }
    }
    cleaned
}

pub fn parse_comma_separated(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Thread text is HTML unless `is_html` is explicitly false, in which case
/// newlines become `<br>`.
pub fn build_thread_body(text: &str, is_html: Option<bool>) -> String {
    if is_html.unwrap_or(true) {
        text.to_string()
    } else {
        text.replace('\n', "<br>")
    }
}
