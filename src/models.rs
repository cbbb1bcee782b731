use std::fmt::{Debug, Formatter};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Seconds before nominal expiry at which a cached bearer token is treated as stale.
pub const CACHE_SKEW_SECONDS: i64 = 60;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "authType")]
pub enum Credentials {
    #[serde(rename = "oauth2")]
    OAuth2 {
        #[serde(rename = "appId")]
        app_id: String,
        #[serde(rename = "appSecret")]
        app_secret: String,
    },
    #[serde(rename = "apiKey")]
    ApiKey {
        #[serde(rename = "apiKey")]
        api_key: String,
    },
}

impl Credentials {
    pub fn oauth2(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self::OAuth2 {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    pub fn api_key(api_key: impl Into<String>) -> Self {
        Self::ApiKey {
            api_key: api_key.into(),
        }
    }

    /// Token cache key; only OAuth2 credentials are cached.
    pub fn cache_key(&self) -> Option<&str> {
        match self {
            Self::OAuth2 { app_id, .. } => Some(app_id),
            Self::ApiKey { .. } => None,
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OAuth2 { app_id, .. } => f
                .debug_struct("OAuth2")
                .field("app_id", app_id)
                .field("app_secret", &"[REDACTED]")
                .finish(),
            Self::ApiKey { .. } => f
                .debug_struct("ApiKey")
                .field("api_key", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Host-side credential retrieval. Consulted on every dispatched request.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credentials(&self) -> Result<Credentials>;
}

#[async_trait]
impl CredentialSource for Credentials {
    async fn credentials(&self) -> Result<Credentials> {
        Ok(self.clone())
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(CACHE_SKEW_SECONDS)
    }
}

impl Debug for CachedToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// One outbound call: a path relative to the API base, or an absolute URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub target: String,
    pub body: Value,
    pub query: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            body: Value::Null,
            query: Vec::new(),
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    pub fn post(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, target).with_body(body)
    }

    pub fn put(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, target).with_body(body)
    }

    pub fn patch(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, target).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Sets `key`, replacing any existing pair with the same name.
    pub fn set_query(&mut self, key: &str, value: impl Into<String>) {
        self.query.retain(|(existing, _)| existing != key);
        self.query.push((key.to_string(), value.into()));
    }

    /// Empty objects and arrays are not sent.
    pub fn has_body(&self) -> bool {
        match &self.body {
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Null => false,
            _ => true,
        }
    }
}

/// HAL page: `_embedded.<collection>` records plus `_links.<name>.href` navigation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagedResponse {
    pub embedded: Map<String, Value>,
    pub links: Map<String, Value>,
    pub page: Option<PageInfo>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub number: u64,
}

impl PagedResponse {
    pub fn from_value(value: &Value) -> Self {
        let object = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default()
        };

        Self {
            embedded: object("_embedded"),
            links: object("_links"),
            page: value
                .get("page")
                .and_then(|page| serde_json::from_value(page.clone()).ok()),
        }
    }

    pub fn collection(&self, name: &str) -> Vec<Value> {
        self.embedded
            .get(name)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    pub fn link(&self, name: &str) -> Option<&str> {
        self.links
            .get(name)
            .and_then(|link| link.get("href"))
            .and_then(Value::as_str)
            .filter(|href| !href.trim().is_empty())
    }

    pub fn next_link(&self) -> Option<&str> {
        self.link("next")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRegistration {
    pub webhook_id: Option<u64>,
    pub target_url: String,
    pub secret: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
    pub payload_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Entry of a configuration-time dropdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionItem {
    pub name: String,
    pub value: Value,
}
