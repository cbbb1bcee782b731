use std::sync::{Arc, Once};

use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::models::{CredentialSource, OptionItem};
use crate::operations::{self, Operation};
use crate::options;
use crate::transport::{ClientConfig, HelpScoutClient};
use crate::webhook::{VerificationPolicy, WebhookLifecycle, WebhookStateStore};

/// Everything a workflow host calls: operation execution, option lists and
/// the webhook lifecycle.
pub struct Connector {
    client: HelpScoutClient,
    webhooks: WebhookLifecycle,
    notice: Once,
}

impl Connector {
    pub fn new(
        config: ClientConfig,
        credentials: Arc<dyn CredentialSource>,
        state: Arc<dyn WebhookStateStore>,
    ) -> Result<Self> {
        let client = HelpScoutClient::new(config, credentials)?;
        Ok(Self::from_client(client, state))
    }

    pub fn from_client(client: HelpScoutClient, state: Arc<dyn WebhookStateStore>) -> Self {
        let webhooks = WebhookLifecycle::new(client.clone(), state);
        Self {
            client,
            webhooks,
            notice: Once::new(),
        }
    }

    pub fn with_verification_policy(mut self, policy: VerificationPolicy) -> Self {
        self.webhooks = self.webhooks.with_policy(policy);
        self
    }

    pub fn client(&self) -> &HelpScoutClient {
        &self.client
    }

    pub fn webhooks(&self) -> &WebhookLifecycle {
        &self.webhooks
    }

    /// Logs the connector banner the first time it is called. Returns whether
    /// this call emitted it.
    pub fn emit_startup_notice(&self) -> bool {
        let mut emitted = false;
        self.notice.call_once(|| {
            info!(
                connector = env!("CARGO_PKG_NAME"),
                version = env!("CARGO_PKG_VERSION"),
                "help scout connector ready"
            );
            emitted = true;
        });
        emitted
    }

    pub async fn execute(
        &self,
        resource: &str,
        operation: &str,
        items: &[Value],
        continue_on_fail: bool,
    ) -> Result<Vec<Value>> {
        self.emit_startup_notice();
        let operation = Operation::parse(resource, operation)?;
        operations::execute(&self.client, operation, items, continue_on_fail).await
    }

    pub async fn mailbox_options(&self) -> Result<Vec<OptionItem>> {
        options::mailbox_options(&self.client).await
    }

    pub async fn user_options(&self) -> Result<Vec<OptionItem>> {
        options::user_options(&self.client).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Connector;
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

    #[test]
    fn startup_notice_fires_once_per_connector() {
        let first = connector();
        assert!(first.emit_startup_notice());
        assert!(!first.emit_startup_notice());

        assert!(connector().emit_startup_notice());
    }

    #[tokio::test]
    async fn unknown_operations_fail_before_any_request() {
        let error = connector()
            .execute("ticket", "get", &[serde_json::json!({})], true)
            .await
            .expect_err("unsupported pair");
        assert!(error.to_string().contains("ticket"));
    }
}
