use serde_json::Value;

use super::{fetch, list};
use crate::error::Result;
use crate::models::RequestSpec;
use crate::params::Parameters;
use crate::transport::HelpScoutClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxOperation {
    Get,
    GetAll,
    GetFolders,
    GetFields,
}

impl MailboxOperation {
    pub const ALL: &'static [Self] = &[Self::Get, Self::GetAll, Self::GetFolders, Self::GetFields];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::GetAll => "getAll",
            Self::GetFolders => "getFolders",
            Self::GetFields => "getFields",
        }
    }

    pub(crate) async fn run(
        &self,
        client: &HelpScoutClient,
        params: &Parameters,
    ) -> Result<Vec<Value>> {
        match self {
            Self::Get => {
                let id = params.required_id("mailboxId")?;
                fetch(client, RequestSpec::get(format!("/mailboxes/{id}"))).await
            }
            Self::GetAll => list(client, params, RequestSpec::get("/mailboxes"), "mailboxes").await,
            Self::GetFolders => {
                let id = params.required_id("mailboxId")?;
                let spec = RequestSpec::get(format!("/mailboxes/{id}/folders"));
                client.collect_all(&spec, "folders").await
            }
            Self::GetFields => {
                let id = params.required_id("mailboxId")?;
                let spec = RequestSpec::get(format!("/mailboxes/{id}/fields"));
                client.collect_all(&spec, "fields").await
            }
        }
    }
}
