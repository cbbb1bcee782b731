use serde_json::{json, Value};

use super::{acknowledge, cleaned, fetch, list};
use crate::error::Result;
use crate::models::RequestSpec;
use crate::params::{build_query_params, Parameters};
use crate::transport::HelpScoutClient;

/// Profile fields accepted on both create and update.
const PROFILE_FIELDS: &[&str] = &[
    "jobTitle",
    "organization",
    "background",
    "gender",
    "age",
    "location",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerOperation {
    Create,
    Get,
    GetAll,
    Update,
    Delete,
    GetConversations,
}

impl CustomerOperation {
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
                let body = create_body(params)?;
                fetch(client, RequestSpec::post("/customers", cleaned(body))).await
            }
            Self::Get => {
                let id = params.required_id("customerId")?;
                fetch(client, RequestSpec::get(format!("/customers/{id}"))).await
            }
            Self::GetAll => {
                let query = build_query_params(params.collection("filters").as_map());
                let spec = RequestSpec::get("/customers").with_query(query);
                list(client, params, spec, "customers").await
            }
            Self::Update => {
                let id = params.required_id("customerId")?;
                let fields = params.collection("updateFields");
                let mut body = json!({
                    "firstName": fields.truthy("firstName"),
                    "lastName": fields.truthy("lastName"),
                });
                copy_profile_fields(&mut body, &fields);

                client
                    .send(&RequestSpec::put(format!("/customers/{id}"), cleaned(body)))
                    .await?;
                fetch(client, RequestSpec::get(format!("/customers/{id}"))).await
            }
            Self::Delete => {
                let id = params.required_id("customerId")?;
                let spec = RequestSpec::delete(format!("/customers/{id}"));
                acknowledge(client, spec, json!({ "customerId": id })).await
            }
            Self::GetConversations => {
                let id = params.required_id("customerId")?;
                let spec = RequestSpec::get(format!("/customers/{id}/conversations"));
                list(client, params, spec, "conversations").await
            }
        }
    }
}

fn create_body(params: &Parameters) -> Result<Value> {
    let fields = params.collection("additionalFields");
    let contact = |value_key: &str, type_key: &str| {
        fields.truthy(value_key).map(|value| {
            json!([{
                "type": fields.optional_string(type_key).unwrap_or_else(|| "work".to_string()),
                "value": value,
            }])
        })
    };

    let mut body = json!({
        "firstName": params.required_string("firstName")?,
        "lastName": params.required_string("lastName")?,
        "emails": contact("email", "emailType"),
        "phones": contact("phone", "phoneType"),
    });
    copy_profile_fields(&mut body, &fields);
    Ok(body)
}

fn copy_profile_fields(body: &mut Value, fields: &Parameters) {
    if let Some(map) = body.as_object_mut() {
        for key in PROFILE_FIELDS {
            if let Some(value) = fields.truthy(key) {
                map.insert((*key).to_string(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::create_body;
    use crate::operations::cleaned;
    use crate::params::Parameters;

    #[test]
    fn create_body_defaults_contact_type_to_work() {
        let params = Parameters::new(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "additionalFields": {
                "email": "ada@example.test",
                "phone": "555-0100",
                "phoneType": "mobile",
                "jobTitle": "Analyst",
                "age": ""
            }
        }))
        .expect("params");

        let body = cleaned(create_body(&params).expect("body"));
        assert_eq!(
            body,
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "emails": [{"type": "work", "value": "ada@example.test"}],
                "phones": [{"type": "mobile", "value": "555-0100"}],
                "jobTitle": "Analyst"
            })
        );
    }

    #[test]
    fn create_body_requires_names() {
        let params = Parameters::new(json!({"firstName": "Ada"})).expect("params");
        assert!(create_body(&params).is_err());
    }
}
