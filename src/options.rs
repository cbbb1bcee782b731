use serde_json::Value;

use crate::error::Result;
use crate::models::{OptionItem, RequestSpec};
use crate::transport::HelpScoutClient;

/// Lists every record of `collection` at `path` as `{name, value}` dropdown entries.
pub async fn load_options(
    client: &HelpScoutClient,
    path: &str,
    collection: &str,
    label_field: &str,
    value_field: &str,
) -> Result<Vec<OptionItem>> {
    let items = client
        .collect_all(&RequestSpec::get(path), collection)
        .await?;

    Ok(items
        .iter()
        .map(|item| OptionItem {
            name: label(item.get(label_field)),
            value: item.get(value_field).cloned().unwrap_or(Value::Null),
        })
        .collect())
}

pub async fn mailbox_options(client: &HelpScoutClient) -> Result<Vec<OptionItem>> {
    load_options(client, "/mailboxes", "mailboxes", "name", "id").await
}

pub async fn user_options(client: &HelpScoutClient) -> Result<Vec<OptionItem>> {
    load_options(client, "/users", "users", "email", "id").await
}

fn label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
