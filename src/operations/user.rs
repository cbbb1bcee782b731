use serde_json::Value;

use super::{fetch, list};
use crate::error::Result;
use crate::models::RequestSpec;
use crate::params::{build_query_params, Parameters};
use crate::transport::HelpScoutClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOperation {
    Get,
    GetAll,
    GetResourceOwner,
}

impl UserOperation {
    pub const ALL: &'static [Self] = &[Self::Get, Self::GetAll, Self::GetResourceOwner];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::GetAll => "getAll",
            Self::GetResourceOwner => "getResourceOwner",
        }
    }

    pub(crate) async fn run(
        &self,
        client: &HelpScoutClient,
        params: &Parameters,
    ) -> Result<Vec<Value>> {
        match self {
            Self::Get => {
                let id = params.required_id("userId")?;
                fetch(client, RequestSpec::get(format!("/users/{id}"))).await
            }
            Self::GetAll => {
                let query = build_query_params(params.collection("filters").as_map());
                list(client, params, RequestSpec::get("/users").with_query(query), "users").await
            }
            Self::GetResourceOwner => fetch(client, RequestSpec::get("/users/me")).await,
        }
    }
}
