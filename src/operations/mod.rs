//! Host-facing operations, one closed enum per resource.

pub mod conversation;
pub mod customer;
pub mod mailbox;
pub mod organization;
pub mod report;
pub mod tag;
pub mod thread;
pub mod user;
pub mod webhook;
pub mod workflow;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::{ConnectorError, Result};
use crate::models::RequestSpec;
use crate::params::{clean_object, Parameters};
use crate::transport::HelpScoutClient;

pub use conversation::ConversationOperation;
pub use customer::CustomerOperation;
pub use mailbox::MailboxOperation;
pub use organization::OrganizationOperation;
pub use report::ReportOperation;
pub use tag::TagOperation;
pub use thread::ThreadOperation;
pub use user::UserOperation;
pub use webhook::WebhookOperation;
pub use workflow::WorkflowOperation;

/// Page size used for bounded fetches when the caller gives no `limit`.
pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Conversation(ConversationOperation),
    Thread(ThreadOperation),
    Customer(CustomerOperation),
    Organization(OrganizationOperation),
    Mailbox(MailboxOperation),
    User(UserOperation),
    Tag(TagOperation),
    Workflow(WorkflowOperation),
    Report(ReportOperation),
    Webhook(WebhookOperation),
}

impl Operation {
    pub const RESOURCES: &'static [&'static str] = &[
        "conversation",
        "thread",
        "customer",
        "organization",
        "mailbox",
        "user",
        "tag",
        "workflow",
        "report",
        "webhook",
    ];

    pub fn parse(resource: &str, operation: &str) -> Result<Self> {
        let parsed = match resource {
            "conversation" => ConversationOperation::parse(operation).map(Self::Conversation),
            "thread" => ThreadOperation::parse(operation).map(Self::Thread),
            "customer" => CustomerOperation::parse(operation).map(Self::Customer),
            "organization" => OrganizationOperation::parse(operation).map(Self::Organization),
            "mailbox" => MailboxOperation::parse(operation).map(Self::Mailbox),
            "user" => UserOperation::parse(operation).map(Self::User),
            "tag" => TagOperation::parse(operation).map(Self::Tag),
            "workflow" => WorkflowOperation::parse(operation).map(Self::Workflow),
            "report" => ReportOperation::parse(operation).map(Self::Report),
            "webhook" => WebhookOperation::parse(operation).map(Self::Webhook),
            _ => None,
        };

        parsed.ok_or_else(|| ConnectorError::UnsupportedOperation {
            resource: resource.to_string(),
            operation: operation.to_string(),
        })
    }

    pub fn resource(&self) -> &'static str {
        match self {
            Self::Conversation(_) => "conversation",
            Self::Thread(_) => "thread",
            Self::Customer(_) => "customer",
            Self::Organization(_) => "organization",
            Self::Mailbox(_) => "mailbox",
            Self::User(_) => "user",
            Self::Tag(_) => "tag",
            Self::Workflow(_) => "workflow",
            Self::Report(_) => "report",
            Self::Webhook(_) => "webhook",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Conversation(op) => op.name(),
            Self::Thread(op) => op.name(),
            Self::Customer(op) => op.name(),
            Self::Organization(op) => op.name(),
            Self::Mailbox(op) => op.name(),
            Self::User(op) => op.name(),
            Self::Tag(op) => op.name(),
            Self::Workflow(op) => op.name(),
            Self::Report(op) => op.name(),
            Self::Webhook(op) => op.name(),
        }
    }

    /// Runs the operation for one input item.
    pub async fn run(&self, client: &HelpScoutClient, params: &Parameters) -> Result<Vec<Value>> {
        debug!(resource = self.resource(), operation = self.name(), "running operation");
        match self {
            Self::Conversation(op) => op.run(client, params).await,
            Self::Thread(op) => op.run(client, params).await,
            Self::Customer(op) => op.run(client, params).await,
            Self::Organization(op) => op.run(client, params).await,
            Self::Mailbox(op) => op.run(client, params).await,
            Self::User(op) => op.run(client, params).await,
            Self::Tag(op) => op.run(client, params).await,
            Self::Workflow(op) => op.run(client, params).await,
            Self::Report(op) => op.run(client, params).await,
            Self::Webhook(op) => op.run(client, params).await,
        }
    }
}

/// Runs `operation` once per item, in order.
///
/// With `continue_on_fail` a failing item yields `{"error": "<message>"}` and
/// the run proceeds; otherwise the first failure aborts the run.
pub async fn execute(
    client: &HelpScoutClient,
    operation: Operation,
    items: &[Value],
    continue_on_fail: bool,
) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let outcome = match Parameters::new(item.clone()) {
            Ok(params) => operation.run(client, &params).await,
            Err(error) => Err(error),
        };

        match outcome {
            Ok(mut produced) => records.append(&mut produced),
            Err(error) if continue_on_fail => {
                warn!(
                    resource = operation.resource(),
                    operation = operation.name(),
                    item = index,
                    error = %error,
                    "operation failed, continuing"
                );
                records.push(json!({ "error": error.to_string() }));
            }
            Err(error) => return Err(error),
        }
    }
    Ok(records)
}

/// One record per array element, otherwise the value itself.
pub fn to_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Collection fetch honouring `returnAll` and `limit`.
pub(crate) async fn list(
    client: &HelpScoutClient,
    params: &Parameters,
    spec: RequestSpec,
    collection: &str,
) -> Result<Vec<Value>> {
    if params.bool_or("returnAll", false) {
        return client.collect_all(&spec, collection).await;
    }

    let limit = params.optional_limit("limit")?.unwrap_or(DEFAULT_LIMIT);
    client.fetch_limited(&spec, collection, limit).await
}

pub(crate) async fn fetch(client: &HelpScoutClient, spec: RequestSpec) -> Result<Vec<Value>> {
    Ok(to_records(client.send(&spec).await?))
}

/// Request body with empty values stripped.
pub(crate) fn cleaned(body: Value) -> Value {
    match body {
        Value::Object(map) => Value::Object(clean_object(map)),
        other => other,
    }
}

/// Sends a mutation and returns a synthetic acknowledgement built from `summary`.
pub(crate) async fn acknowledge(
    client: &HelpScoutClient,
    spec: RequestSpec,
    summary: Value,
) -> Result<Vec<Value>> {
    client.send(&spec).await?;
    let mut record = Map::new();
    record.insert("success".to_string(), Value::Bool(true));
    if let Value::Object(summary) = summary {
        record.extend(summary);
    }
    Ok(vec![Value::Object(record)])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        to_records, ConversationOperation, Operation, ReportOperation, ThreadOperation,
    };
    use crate::error::ConnectorError;

    #[test]
    fn parse_resolves_known_pairs() {
        assert_eq!(
            Operation::parse("conversation", "getAll").expect("parse"),
            Operation::Conversation(ConversationOperation::GetAll)
        );
        assert_eq!(
            Operation::parse("thread", "createNote").expect("parse"),
            Operation::Thread(ThreadOperation::CreateNote)
        );
        assert_eq!(
            Operation::parse("report", "getHappiness").expect("parse"),
            Operation::Report(ReportOperation::GetHappiness)
        );
    }

    #[test]
    fn parse_rejects_unknown_pairs() {
        let error = Operation::parse("conversation", "explode").expect_err("unknown op");
        assert!(matches!(
            error,
            ConnectorError::UnsupportedOperation { ref resource, ref operation }
                if resource == "conversation" && operation == "explode"
        ));
        assert!(Operation::parse("invoice", "get").is_err());
        // operations are scoped to their resource
        assert!(Operation::parse("tag", "delete").is_err());
    }

    #[test]
    fn every_operation_round_trips_through_its_name() {
        let pairs = [
            (
                "conversation",
                ConversationOperation::ALL
                    .iter()
                    .map(|op| op.name())
                    .collect::<Vec<_>>(),
            ),
            ("thread", ThreadOperation::ALL.iter().map(|op| op.name()).collect()),
            ("report", ReportOperation::ALL.iter().map(|op| op.name()).collect()),
        ];
        for (resource, names) in pairs {
            for name in names {
                let parsed = Operation::parse(resource, name).expect("known operation");
                assert_eq!(parsed.resource(), resource);
                assert_eq!(parsed.name(), name);
            }
        }
    }

    #[test]
    fn records_split_arrays() {
        assert_eq!(to_records(json!([{"id": 1}, {"id": 2}])).len(), 2);
        assert_eq!(to_records(json!({"id": 1})), vec![json!({"id": 1})]);
    }
}
