use crate::condition::ConditionGroup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Suffix appended to an I/O node's id to name its failure edge handle.
pub const FAILURE_HANDLE_SUFFIX: &str = ":failure";

/// The closed set of step kinds, by their wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    Start,
    Webhook,
    HttpRequest,
    BubbleText,
    BubbleNumber,
    BubbleImage,
    BubbleVideo,
    BubbleAudio,
    BubbleDocument,
    InputText,
    InputNumber,
    InputMail,
    InputPhone,
    InputImage,
    InputVideo,
    InputAudio,
    InputDocument,
    InputButtons,
    InputWebsite,
    SetVariable,
    Script,
    Condition,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::Webhook => "webhook",
            NodeType::HttpRequest => "http-request",
            NodeType::BubbleText => "bubble-text",
            NodeType::BubbleNumber => "bubble-number",
            NodeType::BubbleImage => "bubble-image",
            NodeType::BubbleVideo => "bubble-video",
            NodeType::BubbleAudio => "bubble-audio",
            NodeType::BubbleDocument => "bubble-document",
            NodeType::InputText => "input-text",
            NodeType::InputNumber => "input-number",
            NodeType::InputMail => "input-mail",
            NodeType::InputPhone => "input-phone",
            NodeType::InputImage => "input-image",
            NodeType::InputVideo => "input-video",
            NodeType::InputAudio => "input-audio",
            NodeType::InputDocument => "input-document",
            NodeType::InputButtons => "input-buttons",
            NodeType::InputWebsite => "input-website",
            NodeType::SetVariable => "set-variable",
            NodeType::Script => "script",
            NodeType::Condition => "condition",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

/// Free-form inputs; button inputs have their own variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    Text,
    Number,
    Mail,
    Phone,
    Website,
    Image,
    Video,
    Audio,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IoKind {
    Webhook,
    HttpRequest,
    Script,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub name: String,
    #[serde(default)]
    pub default_value: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConfig {
    #[serde(default)]
    pub initial_variables: Vec<VariableDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBubbleConfig {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBubbleConfig {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConfig {
    #[serde(default)]
    pub save_variable: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub retry_message: Option<String>,
    /// Lower bound, number inputs only.
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound, number inputs only.
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonItem {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub save_variable: Option<String>,
}

impl ButtonItem {
    /// The value stored when this button is picked: its explicit value, else its label.
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonsConfig {
    pub buttons: Vec<ButtonItem>,
    #[serde(default)]
    pub save_variable: Option<String>,
    #[serde(default)]
    pub is_multiple_choice: bool,
    #[serde(default)]
    pub retry_message: Option<String>,
}

impl ButtonsConfig {
    pub fn button(&self, id: &str) -> Option<&ButtonItem> {
        self.buttons.iter().find(|b| b.id == id)
    }

    pub fn button_by_label(&self, text: &str) -> Option<&ButtonItem> {
        let text = text.trim().to_lowercase();
        self.buttons
            .iter()
            .find(|b| b.label.trim().to_lowercase() == text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableConfig {
    pub variable_name: String,
    /// Template rendered against the session's variables before storing.
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    #[serde(default)]
    pub groups: Vec<ConditionGroup>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub save_variable: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequestConfig {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub save_variable: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptConfig {
    pub code: String,
    #[serde(default)]
    pub save_variable: Option<String>,
}

/// A node's behavior together with its strongly typed configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Start(StartConfig),
    TextBubble(TextBubbleConfig),
    NumberBubble(TextBubbleConfig),
    MediaBubble {
        media: MediaKind,
        config: MediaBubbleConfig,
    },
    Input {
        input: InputKind,
        config: InputConfig,
    },
    Buttons(ButtonsConfig),
    SetVariable(SetVariableConfig),
    Condition(ConditionConfig),
    Webhook(WebhookConfig),
    HttpRequest(HttpRequestConfig),
    Script(ScriptConfig),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Start(_) => NodeType::Start,
            NodeKind::TextBubble(_) => NodeType::BubbleText,
            NodeKind::NumberBubble(_) => NodeType::BubbleNumber,
            NodeKind::MediaBubble { media, .. } => match media {
                MediaKind::Image => NodeType::BubbleImage,
                MediaKind::Video => NodeType::BubbleVideo,
                MediaKind::Audio => NodeType::BubbleAudio,
                MediaKind::Document => NodeType::BubbleDocument,
            },
            NodeKind::Input { input, .. } => match input {
                InputKind::Text => NodeType::InputText,
                InputKind::Number => NodeType::InputNumber,
                InputKind::Mail => NodeType::InputMail,
                InputKind::Phone => NodeType::InputPhone,
                InputKind::Website => NodeType::InputWebsite,
                InputKind::Image => NodeType::InputImage,
                InputKind::Video => NodeType::InputVideo,
                InputKind::Audio => NodeType::InputAudio,
                InputKind::Document => NodeType::InputDocument,
            },
            NodeKind::Buttons(_) => NodeType::InputButtons,
            NodeKind::SetVariable(_) => NodeType::SetVariable,
            NodeKind::Condition(_) => NodeType::Condition,
            NodeKind::Webhook(_) => NodeType::Webhook,
            NodeKind::HttpRequest(_) => NodeType::HttpRequest,
            NodeKind::Script(_) => NodeType::Script,
        }
    }

    pub fn io_kind(&self) -> Option<IoKind> {
        match self {
            NodeKind::Webhook(_) => Some(IoKind::Webhook),
            NodeKind::HttpRequest(_) => Some(IoKind::HttpRequest),
            NodeKind::Script(_) => Some(IoKind::Script),
            _ => None,
        }
    }

    /// Whether execution suspends at this node until an inbound event arrives.
    pub fn is_suspending(&self) -> bool {
        matches!(self, NodeKind::Input { .. } | NodeKind::Buttons(_)) || self.io_kind().is_some()
    }

    /// Every variable name this node may write.
    pub fn produced_variables(&self) -> Vec<&str> {
        match self {
            NodeKind::Start(config) => config
                .initial_variables
                .iter()
                .map(|v| v.name.as_str())
                .collect(),
            NodeKind::Input { config, .. } => config.save_variable.as_deref().into_iter().collect(),
            NodeKind::Buttons(config) => config
                .save_variable
                .as_deref()
                .into_iter()
                .chain(
                    config
                        .buttons
                        .iter()
                        .filter_map(|b| b.save_variable.as_deref()),
                )
                .collect(),
            NodeKind::SetVariable(config) => vec![config.variable_name.as_str()],
            NodeKind::Webhook(config) => config.save_variable.as_deref().into_iter().collect(),
            NodeKind::HttpRequest(config) => {
                config.save_variable.as_deref().into_iter().collect()
            }
            NodeKind::Script(config) => config.save_variable.as_deref().into_iter().collect(),
            NodeKind::TextBubble(_)
            | NodeKind::NumberBubble(_)
            | NodeKind::MediaBubble { .. }
            | NodeKind::Condition(_) => Vec::new(),
        }
    }

    /// Branch handles declared by this node's configuration (button and group ids).
    pub fn branch_handles(&self) -> Vec<&str> {
        match self {
            NodeKind::Buttons(config) => config.buttons.iter().map(|b| b.id.as_str()).collect(),
            NodeKind::Condition(config) => config.groups.iter().map(|g| g.id.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// A compiled step.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn failure_handle(&self) -> String {
        format!("{}{}", self.id, FAILURE_HANDLE_SUFFIX)
    }
}
