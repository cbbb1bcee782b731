use serde_json::{json, Map, Value};

use super::cleaned;
use crate::error::Result;
use crate::models::RequestSpec;
use crate::params::{build_thread_body, parse_comma_separated, Parameters};
use crate::transport::HelpScoutClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOperation {
    CreateCustomer,
    CreateReply,
    CreateNote,
    CreatePhone,
    CreateChat,
    GetSource,
}

impl ThreadOperation {
    pub const ALL: &'static [Self] = &[
        Self::CreateCustomer,
        Self::CreateReply,
        Self::CreateNote,
        Self::CreatePhone,
        Self::CreateChat,
        Self::GetSource,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateCustomer => "createCustomer",
            Self::CreateReply => "createReply",
            Self::CreateNote => "createNote",
            Self::CreatePhone => "createPhone",
            Self::CreateChat => "createChat",
            Self::GetSource => "getSource",
        }
    }

    /// Thread type and the conversation sub-path it is posted to.
    fn endpoint(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::CreateCustomer => Some(("customer", "customer")),
            Self::CreateReply => Some(("reply", "reply")),
            Self::CreateNote => Some(("note", "notes")),
            Self::CreatePhone => Some(("phone", "phones")),
            Self::CreateChat => Some(("chat", "chats")),
            Self::GetSource => None,
        }
    }

    pub(crate) async fn run(
        &self,
        client: &HelpScoutClient,
        params: &Parameters,
    ) -> Result<Vec<Value>> {
        let conversation_id = params.required_id("conversationId")?;

        let Some((thread_type, path)) = self.endpoint() else {
            let thread_id = params.required_id("threadId")?;
            let spec = RequestSpec::get(format!(
                "/conversations/{conversation_id}/threads/{thread_id}/original-source"
            ));
            return Ok(vec![client.send(&spec).await?]);
        };

        let body = self.body(thread_type, params)?;
        let response = client
            .send(&RequestSpec::post(
                format!("/conversations/{conversation_id}/{path}"),
                cleaned(body),
            ))
            .await?;

        let mut record = Map::new();
        record.insert("success".to_string(), Value::Bool(true));
        record.insert("conversationId".to_string(), json!(conversation_id));
        if let Value::Object(response) = response {
            record.extend(response);
        }
        Ok(vec![Value::Object(record)])
    }

    fn body(&self, thread_type: &str, params: &Parameters) -> Result<Value> {
        let text = params.required_string("text")?;
        let fields = params.collection("additionalFields");
        let comma_list = |key: &str| {
            fields
                .optional_string(key)
                .map(|raw| parse_comma_separated(&raw))
        };

        let mut body = json!({
            "type": thread_type,
            "text": build_thread_body(&text, fields.optional_bool("isHtml")),
        });
        let Some(map) = body.as_object_mut() else {
            return Ok(body);
        };

        if matches!(self, Self::CreateCustomer | Self::CreatePhone | Self::CreateChat) {
            let email = params.required_string("customerEmail")?;
            map.insert("customer".to_string(), json!({ "email": email }));
        }
        if !matches!(self, Self::CreateNote) {
            map.insert("status".to_string(), fields.truthy("status").into());
        }
        if matches!(self, Self::CreateCustomer | Self::CreateReply) {
            map.insert("draft".to_string(), fields.truthy("draft").into());
            map.insert("cc".to_string(), comma_list("cc").into());
            map.insert("bcc".to_string(), comma_list("bcc").into());
        }
        if matches!(self, Self::CreateCustomer) {
            map.insert("imported".to_string(), fields.truthy("imported").into());
        } else {
            map.insert("user".to_string(), fields.truthy("userId").into());
        }

        Ok(body)
    }
}
