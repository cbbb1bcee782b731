pub mod auth;
pub mod connector;
pub mod error;
pub mod mcp;
pub mod models;
pub mod operations;
pub mod options;
pub mod output;
pub mod params;
pub mod transport;
pub mod webhook;

pub use connector::Connector;
pub use error::{ConnectorError, Result};
pub use models::{Credentials, CredentialSource};
pub use transport::{ClientConfig, HelpScoutClient};
