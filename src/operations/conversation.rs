use serde_json::{json, Value};

use super::{acknowledge, cleaned, fetch, list};
use crate::error::Result;
use crate::models::RequestSpec;
use crate::params::{build_query_params, parse_comma_separated, Parameters};
use crate::transport::{simplify_response, HelpScoutClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationOperation {
    Create,
    Get,
    GetAll,
    Update,
    Delete,
    ChangeStatus,
    ChangeMailbox,
    AssignUser,
    AddTags,
    RemoveTags,
    GetThreads,
}

impl ConversationOperation {
    pub const ALL: &'static [Self] = &[
        Self::Create,
        Self::Get,
        Self::GetAll,
        Self::Update,
        Self::Delete,
        Self::ChangeStatus,
        Self::ChangeMailbox,
        Self::AssignUser,
        Self::AddTags,
        Self::RemoveTags,
        Self::GetThreads,
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
            Self::ChangeStatus => "changeStatus",
            Self::ChangeMailbox => "changeMailbox",
            Self::AssignUser => "assignUser",
            Self::AddTags => "addTags",
            Self::RemoveTags => "removeTags",
            Self::GetThreads => "getThreads",
        }
    }

    pub(crate) async fn run(
        &self,
        client: &HelpScoutClient,
        params: &Parameters,
    ) -> Result<Vec<Value>> {
        match self {
            Self::Create => create(client, params).await,
            Self::Get => get(client, params).await,
            Self::GetAll => {
                let query = build_query_params(params.collection("filters").as_map());
                let spec = RequestSpec::get("/conversations").with_query(query);
                list(client, params, spec, "conversations").await
            }
            Self::Update => update(client, params).await,
            Self::Delete => {
                let id = params.required_id("conversationId")?;
                let spec = RequestSpec::delete(format!("/conversations/{id}"));
                acknowledge(client, spec, json!({ "conversationId": id })).await
            }
            Self::ChangeStatus => {
                let id = params.required_id("conversationId")?;
                let status = params.required_string("status")?;
                let patch = json!([{ "op": "replace", "path": "/status", "value": status }]);
                let spec = RequestSpec::patch(format!("/conversations/{id}"), patch);
                acknowledge(client, spec, json!({ "conversationId": id, "status": status })).await
            }
            Self::ChangeMailbox => {
                let id = params.required_id("conversationId")?;
                let mailbox_id = params.required_id("mailboxId")?;
                let patch = json!([{ "op": "move", "path": "/mailboxId", "value": mailbox_id }]);
                let spec = RequestSpec::patch(format!("/conversations/{id}"), patch);
                acknowledge(
                    client,
                    spec,
                    json!({ "conversationId": id, "mailboxId": mailbox_id }),
                )
                .await
            }
            Self::AssignUser => {
                let id = params.required_id("conversationId")?;
                let user_id = params.required_id("userId")?;
                let patch = json!([{ "op": "replace", "path": "/assignTo", "value": user_id }]);
                let spec = RequestSpec::patch(format!("/conversations/{id}"), patch);
                acknowledge(client, spec, json!({ "conversationId": id, "userId": user_id })).await
            }
            Self::AddTags => {
                let id = params.required_id("conversationId")?;
                let tags = params.string_list("tags");
                let spec = RequestSpec::put(
                    format!("/conversations/{id}/tags"),
                    json!({ "tags": tags }),
                );
                acknowledge(client, spec, json!({ "conversationId": id, "tags": tags })).await
            }
            Self::RemoveTags => {
                let id = params.required_id("conversationId")?;
                let spec = RequestSpec::delete(format!("/conversations/{id}/tags"));
                acknowledge(client, spec, json!({ "conversationId": id })).await
            }
            Self::GetThreads => {
                let id = params.required_id("conversationId")?;
                let spec = RequestSpec::get(format!("/conversations/{id}/threads"));
                client.collect_all(&spec, "threads").await
            }
        }
    }
}

async fn create(client: &HelpScoutClient, params: &Parameters) -> Result<Vec<Value>> {
    let mailbox_id = params.required_id("mailboxId")?;
    let subject = params.required_string("subject")?;
    let customer_email = params.required_string("customerEmail")?;
    let fields = params.collection("additionalFields");
    let comma_list = |key: &str| {
        fields
            .optional_string(key)
            .map(|raw| parse_comma_separated(&raw))
    };

    let body = json!({
        "type": fields.optional_string("type").unwrap_or_else(|| "email".to_string()),
        "mailboxId": mailbox_id,
        "subject": subject,
        "customer": { "email": customer_email },
        "threads": [{
            "type": "customer",
            "customer": { "email": customer_email },
            "text": fields.optional_string("text").unwrap_or_default(),
        }],
        "status": fields.truthy("status"),
        "assignTo": fields.truthy("assignTo"),
        "tags": comma_list("tags"),
        "cc": comma_list("cc"),
        "bcc": comma_list("bcc"),
    });

    fetch(client, RequestSpec::post("/conversations", cleaned(body))).await
}

async fn get(client: &HelpScoutClient, params: &Parameters) -> Result<Vec<Value>> {
    let id = params.required_id("conversationId")?;
    let options = params.collection("options");

    let mut spec = RequestSpec::get(format!("/conversations/{id}"));
    if let Some(embed) = options.optional_string("embed") {
        spec.set_query("embed", embed);
    }

    let response = client.send(&spec).await?;
    if options.bool_or("simplify", false) {
        return Ok(vec![simplify_response(response)]);
    }
    Ok(vec![response])
}

/// JSON-Patch `replace` for each supplied field, then the refreshed conversation.
async fn update(client: &HelpScoutClient, params: &Parameters) -> Result<Vec<Value>> {
    let id = params.required_id("conversationId")?;
    let fields = params.collection("updateFields");

    let patch: Vec<Value> = ["subject", "status", "assignTo"]
        .into_iter()
        .filter_map(|field| {
            fields.truthy(field).map(|value| {
                json!({ "op": "replace", "path": format!("/{field}"), "value": value })
            })
        })
        .collect();

    client
        .send(&RequestSpec::patch(format!("/conversations/{id}"), Value::Array(patch)))
        .await?;
    get(client, params).await
}
