use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};

use crate::connector::Connector;
use crate::operations::Operation;
use crate::webhook::{WebhookOptions, SUPPORTED_EVENTS};

pub fn tool_schemas() -> Vec<Value> {
    vec![
        json!({
            "name": "helpscout_execute",
            "description": "Run a Help Scout operation once per input item",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "resource": {"type": "string", "enum": Operation::RESOURCES},
                    "operation": {"type": "string"},
                    "params": {"type": "object"},
                    "items": {"type": "array", "items": {"type": "object"}},
                    "continue_on_fail": {"type": "boolean"}
                },
                "required": ["resource", "operation"]
            }
        }),
        json!({
            "name": "helpscout_mailboxes",
            "description": "List mailboxes as name/value options",
            "inputSchema": {"type": "object", "properties": {}}
        }),
        json!({
            "name": "helpscout_users",
            "description": "List users as email/value options",
            "inputSchema": {"type": "object", "properties": {}}
        }),
        json!({
            "name": "helpscout_webhook_check",
            "description": "Check whether the receiver webhook is registered",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "callback_url": {"type": "string"}
                },
                "required": ["callback_url"]
            }
        }),
        json!({
            "name": "helpscout_webhook_create",
            "description": "Register the receiver webhook",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "callback_url": {"type": "string"},
                    "events": {
                        "type": "array",
                        "items": {"type": "string", "examples": SUPPORTED_EVENTS}
                    },
                    "payload_version": {"type": "string"},
                    "label": {"type": "string"},
                    "secret": {"type": "string"}
                },
                "required": ["callback_url", "events"]
            }
        }),
        json!({
            "name": "helpscout_webhook_delete",
            "description": "Remove the receiver webhook and forget its secret",
            "inputSchema": {"type": "object", "properties": {}}
        }),
        json!({
            "name": "helpscout_webhook_receive",
            "description": "Verify and normalize one inbound webhook delivery",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "body": {"type": "string", "description": "raw request body"},
                    "signature": {"type": "string"}
                },
                "required": ["body"]
            }
        }),
    ]
}

pub async fn call_tool(connector: &Connector, name: &str, arguments: Value) -> Result<Value> {
    match name {
        "helpscout_execute" => helpscout_execute(connector, &arguments).await,
        "helpscout_mailboxes" => Ok(json!({ "options": connector.mailbox_options().await? })),
        "helpscout_users" => Ok(json!({ "options": connector.user_options().await? })),
        "helpscout_webhook_check" => {
            let callback_url = required_string(&arguments, "callback_url")?;
            let exists = connector.webhooks().check_exists(&callback_url).await?;
            Ok(json!({ "exists": exists }))
        }
        "helpscout_webhook_create" => helpscout_webhook_create(connector, &arguments).await,
        "helpscout_webhook_delete" => {
            let deleted = connector.webhooks().delete().await?;
            Ok(json!({ "deleted": deleted }))
        }
        "helpscout_webhook_receive" => {
            let body = required_raw_string(&arguments, "body")?;
            let signature = optional_string(&arguments, "signature");
            let records = connector
                .webhooks()
                .receive(body.as_bytes(), signature.as_deref())?;
            Ok(json!({ "records": records }))
        }
        other => Err(anyhow!("unknown tool: {other}")),
    }
}

async fn helpscout_execute(connector: &Connector, arguments: &Value) -> Result<Value> {
    let resource = required_string(arguments, "resource")?;
    let operation = required_string(arguments, "operation")?;
    let continue_on_fail = optional_bool(arguments, "continue_on_fail").unwrap_or(false);

    let items = match (arguments.get("items"), arguments.get("params")) {
        (Some(Value::Array(items)), _) => items.clone(),
        (Some(_), _) => return Err(anyhow!("param 'items' must be an array")),
        (None, Some(params)) => vec![params.clone()],
        (None, None) => vec![json!({})],
    };

    let records = connector
        .execute(&resource, &operation, &items, continue_on_fail)
        .await
        .with_context(|| format!("{resource}.{operation}"))?;
    Ok(json!({ "records": records }))
}

async fn helpscout_webhook_create(connector: &Connector, arguments: &Value) -> Result<Value> {
    let callback_url = required_string(arguments, "callback_url")?;
    let events: Vec<String> = arguments
        .get("events")
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let options = WebhookOptions {
        payload_version: optional_string(arguments, "payload_version"),
        label: optional_string(arguments, "label"),
        secret: optional_string(arguments, "secret"),
    };
    let registration = connector
        .webhooks()
        .create(&callback_url, &events, options)
        .await?;

    Ok(json!({
        "webhookId": registration.webhook_id,
        "targetUrl": registration.target_url,
        "events": registration.events,
        "payloadVersion": registration.payload_version,
        "label": registration.label,
    }))
}

fn required_string(arguments: &Value, key: &str) -> Result<String> {
    optional_string(arguments, key).ok_or_else(|| anyhow!("missing required param '{key}'"))
}

fn optional_string(arguments: &Value, key: &str) -> Option<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Untrimmed, since signatures are computed over the exact bytes.
fn required_raw_string(arguments: &Value, key: &str) -> Result<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("missing required param '{key}'"))
}

fn optional_bool(arguments: &Value, key: &str) -> Option<bool> {
    arguments.get(key).and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{optional_string, required_raw_string, required_string, tool_schemas};

    #[test]
    fn schemas_cover_host_surface() {
        let names: Vec<String> = tool_schemas()
            .iter()
            .filter_map(|schema| schema["name"].as_str().map(str::to_string))
            .collect();
        for expected in [
            "helpscout_execute",
            "helpscout_mailboxes",
            "helpscout_users",
            "helpscout_webhook_check",
            "helpscout_webhook_create",
            "helpscout_webhook_delete",
            "helpscout_webhook_receive",
        ] {
            assert!(names.iter().any(|name| name == expected), "missing {expected}");
        }
    }

    #[test]
    fn string_params_trim_except_raw_body() {
        let arguments = json!({"resource": " conversation ", "body": " {} "});
        assert_eq!(
            required_string(&arguments, "resource").expect("resource"),
            "conversation"
        );
        assert_eq!(required_raw_string(&arguments, "body").expect("body"), " {} ");
        assert_eq!(optional_string(&arguments, "missing"), None);
        assert!(required_string(&arguments, "missing").is_err());
    }
}
