use serde_json::{json, Value};

use super::{acknowledge, cleaned, fetch};
use crate::error::{ConnectorError, Result};
use crate::models::RequestSpec;
use crate::params::Parameters;
use crate::transport::HelpScoutClient;
use crate::webhook::{generate_secret, DEFAULT_PAYLOAD_VERSION};

const UPDATE_FIELDS: &[&str] = &["url", "events", "secret", "payloadVersion", "label", "state"];

/// Direct management of webhook registrations, independent of the
/// receiver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOperation {
    Create,
    GetAll,
    Update,
    Delete,
}

impl WebhookOperation {
    pub const ALL: &'static [Self] = &[Self::Create, Self::GetAll, Self::Update, Self::Delete];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::GetAll => "getAll",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub(crate) async fn run(
        &self,
        client: &HelpScoutClient,
        params: &Parameters,
    ) -> Result<Vec<Value>> {
        match self {
            Self::Create => {
                let body = create_body(params)?;
                fetch(client, RequestSpec::post("/webhooks", cleaned(body))).await
            }
            Self::GetAll => client.collect_all(&RequestSpec::get("/webhooks"), "webhooks").await,
            Self::Update => {
                let id = params.required_id("webhookId")?;
                let fields = params.collection("updateFields");
                let mut body = serde_json::Map::new();
                for key in UPDATE_FIELDS {
                    if let Some(value) = fields.truthy(key) {
                        body.insert((*key).to_string(), value);
                    }
                }
                let spec =
                    RequestSpec::put(format!("/webhooks/{id}"), cleaned(Value::Object(body)));
                acknowledge(client, spec, json!({ "webhookId": id })).await
            }
            Self::Delete => {
                let id = params.required_id("webhookId")?;
                let spec = RequestSpec::delete(format!("/webhooks/{id}"));
                acknowledge(client, spec, json!({ "webhookId": id })).await
            }
        }
    }
}

fn create_body(params: &Parameters) -> Result<Value> {
    let url = params.required_string("url")?;
    let events = params.string_list("events");
    if events.is_empty() {
        return Err(ConnectorError::InvalidParameter(
            "at least one webhook event is required".to_string(),
        ));
    }

    let fields = params.collection("additionalFields");
    let secret = match fields.optional_string("secret") {
        Some(secret) => secret,
        None => generate_secret()?,
    };

    Ok(json!({
        "url": url,
        "events": events,
        "secret": secret,
        "payloadVersion": fields
            .optional_string("payloadVersion")
            .unwrap_or_else(|| DEFAULT_PAYLOAD_VERSION.to_string()),
        "label": fields.truthy("label"),
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::create_body;
    use crate::params::Parameters;

    #[test]
    fn create_body_generates_secret_and_defaults_version() {
        let params = Parameters::new(json!({
            "url": "https://hooks.example.test/in",
            "events": ["convo.created"]
        }))
        .expect("params");

        let body = create_body(&params).expect("body");
        assert_eq!(body["payloadVersion"], json!("v2"));
        let secret = body["secret"].as_str().expect("secret");
        assert_eq!(secret.len(), 32);
    }

    #[test]
    fn create_body_keeps_supplied_secret() {
        let params = Parameters::new(json!({
            "url": "https://hooks.example.test/in",
            "events": "convo.created,convo.deleted",
            "additionalFields": {"secret": "mine", "payloadVersion": "v1", "label": "ops"}
        }))
        .expect("params");

        let body = create_body(&params).expect("body");
        assert_eq!(body["secret"], json!("mine"));
        assert_eq!(body["payloadVersion"], json!("v1"));
        assert_eq!(body["events"], json!(["convo.created", "convo.deleted"]));
        assert_eq!(body["label"], json!("ops"));
    }

    #[test]
    fn create_body_requires_events() {
        let params =
            Parameters::new(json!({"url": "https://hooks.example.test/in"})).expect("params");
        assert!(create_body(&params).is_err());
    }
}
