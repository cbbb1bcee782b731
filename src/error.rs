use reqwest::StatusCode;
use thiserror::Error;

const REDACTED_BODY_MAX_LEN: usize = 200;

pub type Result<T, E = ConnectorError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("failed to authenticate with Help Scout: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("rate limit exceeded, please try again later: {body}")]
    RateLimited { body: String },

    #[error("authentication failed, please check your credentials: {body}")]
    Unauthorized { body: String },

    #[error("resource not found: {body}")]
    NotFound { body: String },

    #[error("help scout api request failed: status={status} body={body}")]
    Api { status: StatusCode, body: String },

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("unsupported operation '{operation}' for resource '{resource}'")]
    UnsupportedOperation { resource: String, operation: String },

    #[error("pagination exceeded {max_pages} pages")]
    PageLimitExceeded { max_pages: usize },

    #[error("{0}")]
    Webhook(String),

    #[error("webhook state: {0}")]
    State(String),
}

impl ConnectorError {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn auth_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Auth {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Maps a non-success provider response onto the error taxonomy.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = redact_response_body(body);
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { body },
            StatusCode::UNAUTHORIZED => Self::Unauthorized { body },
            StatusCode::NOT_FOUND => Self::NotFound { body },
            status => Self::Api { status, body },
        }
    }

    /// HTTP status carried by the error, when it came from a provider response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(error) => error.status(),
            _ => None,
        }
    }
}

pub(crate) fn redact_response_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= REDACTED_BODY_MAX_LEN {
        return trimmed.to_string();
    }

    let mut cut = REDACTED_BODY_MAX_LEN;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…[truncated {} bytes]", &trimmed[..cut], trimmed.len())
}
