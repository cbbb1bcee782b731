use serde_json::{json, Value};

use super::{acknowledge, list};
use crate::error::{ConnectorError, Result};
use crate::models::RequestSpec;
use crate::params::{parse_comma_separated, Parameters};
use crate::transport::HelpScoutClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOperation {
    GetAll,
    RunManual,
}

impl WorkflowOperation {
    pub const ALL: &'static [Self] = &[Self::GetAll, Self::RunManual];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetAll => "getAll",
            Self::RunManual => "runManual",
        }
    }

    pub(crate) async fn run(
        &self,
        client: &HelpScoutClient,
        params: &Parameters,
    ) -> Result<Vec<Value>> {
        match self {
            Self::GetAll => list(client, params, RequestSpec::get("/workflows"), "workflows").await,
            Self::RunManual => {
                let workflow_id = params.required_id("workflowId")?;
                let ids = conversation_ids(&params.required_string("conversationIds")?)?;
                let spec = RequestSpec::post(
                    format!("/workflows/{workflow_id}/run"),
                    json!({ "conversationIds": ids }),
                );
                acknowledge(
                    client,
                    spec,
                    json!({ "workflowId": workflow_id, "conversationIds": ids }),
                )
                .await
            }
        }
    }
}

fn conversation_ids(raw: &str) -> Result<Vec<u64>> {
    parse_comma_separated(raw)
        .iter()
        .map(|id| {
            id.parse().map_err(|_| {
                ConnectorError::InvalidParameter(format!(
                    "conversationIds entry '{id}' is not an integer"
                ))
            })
        })
        .collect()
}
