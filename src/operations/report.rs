use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::RequestSpec;
use crate::params::{build_query_params, is_truthy, Parameters};
use crate::transport::HelpScoutClient;

/// Filters forwarded to the aggregate report endpoints.
const REPORT_FILTERS: &[&str] = &[
    "start",
    "end",
    "mailboxes",
    "tags",
    "types",
    "folders",
    "officeHours",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOperation {
    GetCompany,
    GetConversations,
    GetProductivity,
    GetHappiness,
    GetUser,
    GetChat,
    GetEmail,
    GetPhone,
}

impl ReportOperation {
    pub const ALL: &'static [Self] = &[
        Self::GetCompany,
        Self::GetConversations,
        Self::GetProductivity,
        Self::GetHappiness,
        Self::GetUser,
        Self::GetChat,
        Self::GetEmail,
        Self::GetPhone,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetCompany => "getCompany",
            Self::GetConversations => "getConversations",
            Self::GetProductivity => "getProductivity",
            Self::GetHappiness => "getHappiness",
            Self::GetUser => "getUser",
            Self::GetChat => "getChat",
            Self::GetEmail => "getEmail",
            Self::GetPhone => "getPhone",
        }
    }

    fn path(&self) -> &'static str {
        match self {
            Self::GetCompany => "/reports/company",
            Self::GetConversations => "/reports/conversations",
            Self::GetProductivity => "/reports/productivity",
            Self::GetHappiness => "/reports/happiness",
            Self::GetUser => "/reports/user",
            Self::GetChat => "/reports/chat",
            Self::GetEmail => "/reports/email",
            Self::GetPhone => "/reports/phone",
        }
    }

    pub(crate) async fn run(
        &self,
        client: &HelpScoutClient,
        params: &Parameters,
    ) -> Result<Vec<Value>> {
        let filters = params.collection("filters");
        let spec = match self {
            Self::GetUser => {
                let user_id = params.required_id("userId")?;
                RequestSpec::get(format!("{}/{user_id}", self.path()))
                    .with_query(build_query_params(filters.as_map()))
            }
            _ => RequestSpec::get(self.path()).with_query(report_query(&filters)),
        };
        Ok(vec![client.send(&spec).await?])
    }
}

fn report_query(filters: &Parameters) -> Vec<(String, String)> {
    let selected: Map<String, Value> = filters
        .as_map()
        .iter()
        .filter(|(key, value)| REPORT_FILTERS.contains(&key.as_str()) && is_truthy(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    build_query_params(&selected)
}
