use super::session::TerminationReason;
use crate::text::RichSegment;
use crate::workspace::{HttpMethod, InputKind, MediaKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An event fed into a session by the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub session_id: String,
    #[serde(flatten)]
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum InboundKind {
    /// Free text typed by the user.
    Reply(String),
    /// Ids of the buttons the user picked.
    Selection(Vec<String>),
    /// The result of a webhook, http-request or script node.
    WebhookPayload(IoOutcome),
}

impl InboundKind {
    pub fn name(&self) -> &'static str {
        match self {
            InboundKind::Reply(_) => "reply",
            InboundKind::Selection(_) => "selection",
            InboundKind::WebhookPayload(_) => "webhookPayload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IoOutcome {
    Success(String),
    Failure(String),
}

impl InboundEvent {
    pub fn reply(session_id: &str, value: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            kind: InboundKind::Reply(value.into()),
        }
    }

    pub fn selection<S: Into<String>>(
        session_id: &str,
        button_ids: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            kind: InboundKind::Selection(button_ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn io_result(session_id: &str, outcome: IoOutcome) -> Self {
        Self {
            session_id: session_id.to_string(),
            kind: InboundKind::WebhookPayload(outcome),
        }
    }

    pub fn io_success(session_id: &str, value: impl Into<String>) -> Self {
        Self::io_result(session_id, IoOutcome::Success(value.into()))
    }

    pub fn io_failure(session_id: &str, reason: impl Into<String>) -> Self {
        Self::io_result(session_id, IoOutcome::Failure(reason.into()))
    }
}

/// An event produced by a session for the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEvent {
    pub session_id: String,
    #[serde(flatten)]
    pub kind: OutboundKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
pub enum OutboundKind {
    Render(RenderPayload),
    Prompt(PromptPayload),
    ButtonPrompt(ButtonPromptPayload),
    IoRequest(IoRequest),
    Terminated(TerminationReason),
}

impl OutboundEvent {
    pub(crate) fn new(session_id: &str, kind: OutboundKind) -> Self {
        Self {
            session_id: session_id.to_string(),
            kind,
        }
    }

    /// The rendered text of a text or number bubble.
    pub fn rendered_text(&self) -> Option<&str> {
        match &self.kind {
            OutboundKind::Render(RenderPayload {
                content: BubbleContent::Text { text, .. } | BubbleContent::Number { text },
                ..
            }) => Some(text),
            _ => None,
        }
    }

    pub fn io_request(&self) -> Option<&IoRequest> {
        match &self.kind {
            OutboundKind::IoRequest(request) => Some(request),
            _ => None,
        }
    }

    pub fn termination(&self) -> Option<&TerminationReason> {
        match &self.kind {
            OutboundKind::Terminated(reason) => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload {
    pub node_id: String,
    pub content: BubbleContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BubbleContent {
    /// `text` has variables substituted and links left verbatim; `segments`
    /// carries the same content with links split out for rich clients.
    Text {
        text: String,
        segments: Vec<RichSegment>,
    },
    Number {
        text: String,
    },
    Media {
        media: MediaKind,
        url: String,
        caption: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPayload {
    pub node_id: String,
    pub input: InputKind,
    pub variable: Option<String>,
    pub placeholder: Option<String>,
    /// Set when the previous reply was rejected.
    pub retry_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonPromptPayload {
    pub node_id: String,
    pub buttons: Vec<ButtonChoice>,
    pub multiple_choice: bool,
    pub retry_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonChoice {
    pub id: String,
    pub label: String,
}

/// A call the I/O collaborator must perform, with templates already rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoRequest {
    pub node_id: String,
    pub call: IoCall,
    pub variables: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IoCall {
    Webhook {
        url: Option<String>,
    },
    HttpRequest {
        method: HttpMethod,
        url: String,
        headers: BTreeMap<String, String>,
        body: Option<String>,
    },
    Script {
        code: String,
    },
}
