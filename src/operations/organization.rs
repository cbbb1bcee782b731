use serde_json::{json, Value};

use super::{acknowledge, cleaned, fetch, list};
use crate::error::Result;
use crate::models::RequestSpec;
use crate::params::Parameters;
use crate::transport::HelpScoutClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizationOperation {
    Create,
    Get,
    GetAll,
    Update,
    Delete,
    GetConversations,
}

impl OrganizationOperation {
    pub const ALL: &'static [Self] = &[
        Self::Create,
        Self::Get,
        Self::GetAll,
        Self::Update,
        Self::Delete,
        Self::GetConversations,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::GetAll => "getAll",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::GetConversations => "getConversations",
        }
    }

    pub(crate) async fn run(
        &self,
        client: &HelpScoutClient,
        params: &Parameters,
    ) -> Result<Vec<Value>> {
        match self {
            Self::Create => {
                let fields = params.collection("additionalFields");
                let body = json!({
                    "name": params.required_string("name")?,
                    "domain": fields.truthy("domain"),
                });
                fetch(client, RequestSpec::post("/organizations", cleaned(body))).await
            }
            Self::Get => {
                let id = params.required_id("organizationId")?;
                fetch(client, RequestSpec::get(format!("/organizations/{id}"))).await
            }
            Self::GetAll => {
                let spec = RequestSpec::get("/organizations");
                list(client, params, spec, "organizations").await
            }
            Self::Update => {
                let id = params.required_id("organizationId")?;
                let fields = params.collection("updateFields");
                let body = json!({
                    "name": fields.truthy("name"),
                    "domain": fields.truthy("domain"),
                });
                client
                    .send(&RequestSpec::put(format!("/organizations/{id}"), cleaned(body)))
                    .await?;
                fetch(client, RequestSpec::get(format!("/organizations/{id}"))).await
            }
            Self::Delete => {
                let id = params.required_id("organizationId")?;
                let spec = RequestSpec::delete(format!("/organizations/{id}"));
                acknowledge(client, spec, json!({ "organizationId": id })).await
            }
            Self::GetConversations => {
                let id = params.required_id("organizationId")?;
                let spec = RequestSpec::get(format!("/organizations/{id}/conversations"));
                list(client, params, spec, "conversations").await
            }
        }
    }
}
