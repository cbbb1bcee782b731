use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::connector::Connector;
use crate::mcp::tools;

const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Serves newline-delimited JSON-RPC 2.0 on stdin/stdout until stdin closes.
pub async fn run_stdio_server(connector: &Connector) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("read stdin line")? {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(response_line) = handle_request_line(connector, &line).await {
            stdout
                .write_all(format!("{response_line}\n").as_bytes())
                .await
                .context("write stdout response")?;
            stdout.flush().await.context("flush stdout response")?;
        }
    }

    Ok(())
}

async fn handle_request_line(connector: &Connector, line: &str) -> Option<String> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(error) => {
            return Some(
                jsonrpc_error(None, -32700, "Parse error", Some(error.to_string())).to_string(),
            );
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(
            jsonrpc_error(
                request.id,
                -32600,
                "Invalid Request",
                Some("jsonrpc must be \"2.0\"".to_string()),
            )
            .to_string(),
        );
    }

    debug!(method = %request.method, "json-rpc request");
    let id = request.id.clone();
    let response = match request.method.as_str() {
        "initialize" => jsonrpc_result(
            id,
            json!({
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
                "capabilities": {
                    "tools": {}
                }
            }),
        ),
        "tools/list" => jsonrpc_result(id, json!({ "tools": tools::tool_schemas() })),
        "tools/call" => {
            let Some(tool_name) = request.params.get("name").and_then(Value::as_str) else {
                return Some(
                    jsonrpc_error(
                        id,
                        -32602,
                        "Invalid params",
                        Some("tools/call requires params.name".to_string()),
                    )
                    .to_string(),
                );
            };

            let arguments = request
                .params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));
            match tools::call_tool(connector, tool_name, arguments).await {
                Ok(result) => jsonrpc_result(id, result),
                Err(error) => {
                    jsonrpc_error(id, -32000, "Tool execution failed", Some(format!("{error:#}")))
                }
            }
        }
        _ => jsonrpc_error(
            id,
            -32601,
            "Method not found",
            Some(format!("Unknown method '{}'", request.method)),
        ),
    };

    // notifications get no reply
    if request.id.is_none() {
        return None;
    }

    Some(response.to_string())
}

fn jsonrpc_result(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id.unwrap_or(Value::Null),
        "result": result
    })
}

fn jsonrpc_error(id: Option<Value>, code: i64, message: &str, data: Option<String>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message,
    });
    if let Some(data) = data {
        error["data"] = Value::String(data);
    }

    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id.unwrap_or(Value::Null),
        "error": error
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;

    use super::handle_request_line;
    use crate::connector::Connector;
    use crate::models::Credentials;
    use crate::transport::ClientConfig;
    use crate::webhook::MemoryStateStore;

    fn connector() -> Connector {
        Connector::new(
            ClientConfig::default(),
            Arc::new(Credentials::api_key("k")),
            Arc::new(MemoryStateStore::new()),
        )
        .expect("connector")
    }

    async fn respond(line: &str) -> Value {
        let response = handle_request_line(&connector(), line)
            .await
            .expect("response");
        serde_json::from_str(&response).expect("parse response JSON")
    }

    #[tokio::test]
    async fn initialize_returns_server_info_and_capabilities() {
        let response =
            respond(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["serverInfo"]["name"], "helpscout-connector");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_returns_tool_definitions() {
        let response =
            respond(r#"{"jsonrpc":"2.0","id":"abc","method":"tools/list","params":{}}"#).await;
        assert_eq!(response["id"], "abc");
        assert_eq!(response["result"]["tools"].as_array().map(Vec::len), Some(7));
    }

    #[tokio::test]
    async fn invalid_json_returns_parse_error() {
        let response = respond("{").await;
        assert_eq!(response["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn unknown_tool_is_an_execution_error() {
        let response = respond(
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"nope"}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], -32000);
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let reply = handle_request_line(
            &connector(),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;
        assert!(reply.is_none());
    }
}
