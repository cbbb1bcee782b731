pub mod pagination;

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth::{Authenticator, DEFAULT_TOKEN_URL};
use crate::error::{ConnectorError, Result};
use crate::models::{CredentialSource, RequestSpec};

pub use pagination::{embedded_items, extract_id_from_link, simplify_response};

pub const DEFAULT_API_BASE: &str = "https://api.helpscout.net/v2";
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token_url: String,
    /// Upper bound on pages followed by a single paginated collection.
    pub max_pages: Option<usize>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            max_pages: None,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }
}

/// Authenticated request dispatcher for the Help Scout Mailbox API.
#[derive(Clone)]
pub struct HelpScoutClient {
    http: reqwest::Client,
    config: ClientConfig,
    credentials: Arc<dyn CredentialSource>,
    authenticator: Arc<Authenticator>,
}

impl HelpScoutClient {
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialSource>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        let authenticator = Arc::new(Authenticator::new(http.clone(), config.token_url.clone()));
        Ok(Self {
            http,
            config,
            credentials,
            authenticator,
        })
    }

    /// Shares an authenticator (and so its token cache) across clients.
    pub fn with_authenticator(
        config: ClientConfig,
        credentials: Arc<dyn CredentialSource>,
        authenticator: Arc<Authenticator>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            config,
            credentials,
            authenticator,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Issues one request and returns the decoded JSON body.
    ///
    /// An empty success body decodes as `{"success": true}`. A 401 evicts the
    /// cached token before the error is returned.
    pub async fn send(&self, spec: &RequestSpec) -> Result<Value> {
        let credentials = self.credentials.credentials().await?;
        let authorization = self.authenticator.resolve_auth_header(&credentials).await?;
        let url = self.build_url(&spec.target, &spec.query)?;

        debug!(method = %spec.method, url = %url, "help scout request");
        let mut request = self
            .http
            .request(spec.method.clone(), url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if spec.has_body() {
            request = request.json(&spec.body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.authenticator.invalidate(&credentials);
            }
            warn!(method = %spec.method, status = %status, "help scout request failed");
            return Err(ConnectorError::from_status(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(json!({ "success": true }));
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn build_url(&self, target: &str, query: &[(String, String)]) -> Result<Url> {
        let raw = if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                target.trim_start_matches('/')
            )
        };

        let mut url = Url::parse(&raw).map_err(|error| {
            ConnectorError::InvalidParameter(format!("invalid url {raw}: {error}"))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}
