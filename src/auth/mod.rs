pub mod token_cache;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{redact_response_body, ConnectorError, Result};
use crate::models::{CachedToken, Credentials};

pub use token_cache::{MemoryTokenCache, TokenCache};

pub const DEFAULT_TOKEN_URL: &str = "https://api.helpscout.net/v2/oauth2/token";

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Turns credentials into an `Authorization` header value, fetching and
/// caching client-credentials tokens as needed.
#[derive(Clone)]
pub struct Authenticator {
    client: reqwest::Client,
    token_url: String,
    cache: Arc<dyn TokenCache>,
    clock: Clock,
}

impl Authenticator {
    pub fn new(client: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            cache: Arc::new(MemoryTokenCache::new()),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub async fn resolve_auth_header(&self, credentials: &Credentials) -> Result<String> {
        match credentials {
            Credentials::ApiKey { api_key } => Ok(basic_auth_header(api_key)),
            Credentials::OAuth2 { app_id, app_secret } => {
                let token = self.access_token(app_id, app_secret).await?;
                Ok(format!("Bearer {token}"))
            }
        }
    }

    /// Drops any cached token for these credentials so the next call refetches.
    pub fn invalidate(&self, credentials: &Credentials) {
        if let Some(key) = credentials.cache_key() {
            debug!(app_id = key, "evicting cached help scout token");
            self.cache.evict(key);
        }
    }

    async fn access_token(&self, app_id: &str, app_secret: &str) -> Result<String> {
        let now = (self.clock)();
        if let Some(cached) = self.cache.get(app_id) {
            if cached.is_usable_at(now) {
                return Ok(cached.access_token);
            }
        }

        let fresh = self.fetch_token(app_id, app_secret, now).await?;
        let access_token = fresh.access_token.clone();
        self.cache.put(app_id, fresh);
        Ok(access_token)
    }

    async fn fetch_token(
        &self,
        app_id: &str,
        app_secret: &str,
        now: DateTime<Utc>,
    ) -> Result<CachedToken> {
        debug!(token_url = %self.token_url, "requesting help scout oauth token");
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", app_id),
                ("client_secret", app_secret),
            ])
            .send()
            .await
            .map_err(|error| ConnectorError::auth_with_source("token request failed", error))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ConnectorError::auth_with_source("read token response", error))?;
        if !status.is_success() {
            return Err(ConnectorError::auth(format!(
                "token endpoint returned status={} body={}",
                status,
                redact_response_body(&body)
            )));
        }

        let payload: OAuthTokenResponse = serde_json::from_str(&body)
            .map_err(|error| ConnectorError::auth_with_source("decode token response", error))?;
        let access_token = payload
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ConnectorError::auth("Failed to obtain access token"))?;
        let expires_at = now + Duration::seconds(payload.expires_in.unwrap_or(0).max(0));

        Ok(CachedToken::new(access_token, expires_at))
    }
}

/// `Basic base64("<api_key>:X")`.
pub fn basic_auth_header(api_key: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{api_key}:X")))
}
