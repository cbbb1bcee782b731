pub mod event;
pub mod signature;
pub mod store;

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::Clock;
use crate::error::{ConnectorError, Result};
use crate::models::{PagedResponse, RequestSpec, WebhookRegistration};
use crate::transport::{extract_id_from_link, HelpScoutClient};

pub use event::normalize_event;
pub use signature::{compute_signature, generate_secret, verify_signature, SIGNATURE_HEADER};
pub use store::{JsonFileStateStore, MemoryStateStore, WebhookStateStore};

pub const DEFAULT_PAYLOAD_VERSION: &str = "v2";

pub const SUPPORTED_EVENTS: &[&str] = &[
    "convo.created",
    "convo.assigned",
    "convo.moved",
    "convo.status",
    "convo.tags",
    "convo.customer.reply.created",
    "convo.agent.reply.created",
    "convo.note.created",
    "convo.deleted",
    "customer.created",
    "satisfaction.ratings",
];

/// What to do with a delivery that cannot be verified because no secret is
/// stored or no signature header was sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerificationPolicy {
    #[default]
    FailOpen,
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookOptions {
    pub payload_version: Option<String>,
    pub label: Option<String>,
    pub secret: Option<String>,
}

/// Registers, tracks and removes the remote webhook that feeds the receiver,
/// and turns inbound deliveries into event records.
#[derive(Clone)]
pub struct WebhookLifecycle {
    client: HelpScoutClient,
    store: Arc<dyn WebhookStateStore>,
    policy: VerificationPolicy,
    clock: Clock,
}

impl WebhookLifecycle {
    pub fn new(client: HelpScoutClient, store: Arc<dyn WebhookStateStore>) -> Self {
        Self {
            client,
            store,
            policy: VerificationPolicy::default(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_policy(mut self, policy: VerificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> VerificationPolicy {
        self.policy
    }

    pub fn registration(&self) -> Result<Option<WebhookRegistration>> {
        self.store.load()
    }

    /// Whether a remote webhook for `callback_url` exists.
    ///
    /// A stored registration matches on id and URL. Failing that, a remote
    /// webhook with the same URL is adopted into local state.
    pub async fn check_exists(&self, callback_url: &str) -> Result<bool> {
        let stored = self.store.load()?;

        let remote = match self
            .client
            .collect_all(&RequestSpec::get("/webhooks"), "webhooks")
            .await
        {
            Ok(remote) => remote,
            Err(error) => {
                warn!(error = %error, "could not list help scout webhooks");
                return Ok(false);
            }
        };

        if let Some(stored_id) = stored.as_ref().and_then(|registration| registration.webhook_id) {
            let still_registered = remote.iter().any(|webhook| {
                webhook.get("id").and_then(Value::as_u64) == Some(stored_id)
                    && webhook.get("url").and_then(Value::as_str) == Some(callback_url)
            });
            if still_registered {
                return Ok(true);
            }
        }

        let Some(found) = remote
            .iter()
            .find(|webhook| webhook.get("url").and_then(Value::as_str) == Some(callback_url))
        else {
            return Ok(false);
        };

        let mut registration = stored.unwrap_or_else(|| WebhookRegistration {
            webhook_id: None,
            target_url: callback_url.to_string(),
            secret: None,
            events: Vec::new(),
            payload_version: DEFAULT_PAYLOAD_VERSION.to_string(),
            label: None,
        });
        let found_id = found.get("id").and_then(Value::as_u64);
        let found_secret = found
            .get("secret")
            .and_then(Value::as_str)
            .map(str::to_string);
        // a stored secret belongs to the stored webhook only
        let same_webhook =
            registration.webhook_id.is_none() || registration.webhook_id == found_id;
        if found_secret.is_some() || !same_webhook {
            registration.secret = found_secret;
        }
        registration.target_url = callback_url.to_string();
        registration.webhook_id = found_id;
        if let Some(events) = found.get("events").and_then(Value::as_array) {
            registration.events = events
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }
        if let Some(version) = found.get("payloadVersion").and_then(Value::as_str) {
            registration.payload_version = version.to_string();
        }

        info!(webhook_id = ?registration.webhook_id, "adopted existing help scout webhook");
        self.store.save(&registration)?;
        Ok(true)
    }

    pub async fn create(
        &self,
        callback_url: &str,
        events: &[String],
        options: WebhookOptions,
    ) -> Result<WebhookRegistration> {
        if events.is_empty() {
            return Err(ConnectorError::InvalidParameter(
                "at least one webhook event is required".to_string(),
            ));
        }
        for event in events {
            if !SUPPORTED_EVENTS.contains(&event.as_str()) {
                warn!(event = %event, "subscribing to unrecognized help scout event");
            }
        }

        let secret = match options.secret.filter(|secret| !secret.is_empty()) {
            Some(secret) => secret,
            None => generate_secret()?,
        };
        let payload_version = options
            .payload_version
            .unwrap_or_else(|| DEFAULT_PAYLOAD_VERSION.to_string());

        let mut body = json!({
            "url": callback_url,
            "events": events,
            "secret": secret,
            "payloadVersion": payload_version,
        });
        if let (Some(label), Some(map)) = (options.label.as_ref(), body.as_object_mut()) {
            map.insert("label".to_string(), Value::String(label.clone()));
        }

        let response = self
            .client
            .send(&RequestSpec::post("/webhooks", body))
            .await
            .map_err(|error| {
                ConnectorError::Webhook(format!("failed to create webhook: {error}"))
            })?;

        let webhook_id = response.get("id").and_then(Value::as_u64).or_else(|| {
            PagedResponse::from_value(&response)
                .link("self")
                .and_then(extract_id_from_link)
        });

        let registration = WebhookRegistration {
            webhook_id,
            target_url: callback_url.to_string(),
            secret: Some(secret),
            events: events.to_vec(),
            payload_version,
            label: options.label,
        };
        self.store.save(&registration)?;
        info!(webhook_id = ?webhook_id, "registered help scout webhook");
        Ok(registration)
    }

    /// Best-effort remote removal; local state is always cleared.
    pub async fn delete(&self) -> Result<bool> {
        let stored = self.store.load()?;
        if let Some(webhook_id) = stored.and_then(|registration| registration.webhook_id) {
            let spec = RequestSpec::delete(format!("/webhooks/{webhook_id}"));
            match self.client.send(&spec).await {
                Ok(_) => info!(webhook_id, "deleted help scout webhook"),
                Err(error) => {
                    warn!(webhook_id, error = %error, "ignoring webhook deletion failure")
                }
            }
        }

        self.store.clear()?;
        Ok(true)
    }

    /// Verifies and normalizes one inbound delivery.
    ///
    /// Rejections come back as `{"error": ...}` records rather than errors;
    /// only a failing state store is an `Err`.
    pub fn receive(&self, raw_body: &[u8], signature: Option<&str>) -> Result<Vec<Value>> {
        let secret = self
            .store
            .load()?
            .and_then(|registration| registration.secret)
            .filter(|secret| !secret.is_empty());
        let signature = signature.map(str::trim).filter(|value| !value.is_empty());

        match (secret, signature) {
            (Some(secret), Some(signature)) => {
                if !verify_signature(&secret, raw_body, signature) {
                    warn!("rejecting webhook delivery with invalid signature");
                    return Ok(vec![json!({ "error": "Invalid signature" })]);
                }
            }
            _ if self.policy == VerificationPolicy::Strict => {
                warn!("rejecting unverifiable webhook delivery");
                return Ok(vec![json!({ "error": "Unverified delivery" })]);
            }
            (secret, _) => {
                warn!(
                    has_secret = secret.is_some(),
                    "accepting webhook delivery without signature verification"
                );
            }
        }

        let payload = match serde_json::from_slice::<Value>(raw_body) {
            Ok(Value::Object(payload)) => payload,
            Ok(_) | Err(_) => {
                debug!("webhook delivery body is not a JSON object");
                return Ok(vec![json!({ "error": "Invalid payload" })]);
            }
        };

        Ok(vec![normalize_event(payload, (self.clock)())])
    }
}
