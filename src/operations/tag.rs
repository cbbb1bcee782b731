use serde_json::Value;

use crate::error::Result;
use crate::models::RequestSpec;
use crate::params::Parameters;
use crate::transport::HelpScoutClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOperation {
    GetAll,
}

impl TagOperation {
    pub const ALL: &'static [Self] = &[Self::GetAll];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetAll => "getAll",
        }
    }

    pub(crate) async fn run(
        &self,
        client: &HelpScoutClient,
        _params: &Parameters,
    ) -> Result<Vec<Value>> {
        match self {
            Self::GetAll => client.collect_all(&RequestSpec::get("/tags"), "tags").await,
        }
    }
}
