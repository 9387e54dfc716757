use crate::error::Violation;
use crate::variables::normalize_name;
use crate::workspace::*;
use ahash::AHashMap;
use itertools::Itertools;
use serde::de::DeserializeOwned;

/// Defines the contract for turning a node's untyped `config` into a typed `NodeKind`.
pub trait NodeParser: Send + Sync {
    fn node_type(&self) -> &str;
    fn parse(&self, node: &NodeDefinition) -> Result<NodeKind, Violation>;
}

/// Semantic checks a config must pass beyond deserializing.
trait ConfigCheck {
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

impl ConfigCheck for StartConfig {}
impl ConfigCheck for MediaBubbleConfig {}
impl ConfigCheck for InputConfig {
    fn check(&self) -> Result<(), String> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => {
                Err(format!("min ({}) is greater than max ({})", min, max))
            }
            _ => Ok(()),
        }
    }
}
impl ConfigCheck for TextBubbleConfig {}
impl ConfigCheck for WebhookConfig {}
impl ConfigCheck for ScriptConfig {}

impl ConfigCheck for ButtonsConfig {
    fn check(&self) -> Result<(), String> {
        if self.buttons.is_empty() {
            return Err("at least one button is required".to_string());
        }
        if let Some(button) = self.buttons.iter().find(|b| b.id.trim().is_empty()) {
            return Err(format!("button '{}' has an empty id", button.label));
        }
        let duplicates: Vec<&str> = self
            .buttons
            .iter()
            .map(|b| b.id.as_str())
            .duplicates()
            .collect();
        if !duplicates.is_empty() {
            return Err(format!("duplicate button ids: {}", duplicates.join(", ")));
        }
        Ok(())
    }
}

impl ConfigCheck for SetVariableConfig {
    fn check(&self) -> Result<(), String> {
        if normalize_name(&self.variable_name).is_empty() {
            return Err("variableName must not be empty".to_string());
        }
        Ok(())
    }
}

impl ConfigCheck for ConditionConfig {
    fn check(&self) -> Result<(), String> {
        let duplicates: Vec<&str> = self
            .groups
            .iter()
            .map(|g| g.id.as_str())
            .duplicates()
            .collect();
        if !duplicates.is_empty() {
            return Err(format!("duplicate condition group ids: {}", duplicates.join(", ")));
        }
        Ok(())
    }
}

impl ConfigCheck for HttpRequestConfig {
    fn check(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("url must not be empty".to_string());
        }
        Ok(())
    }
}

/// Deserializes the node's config, treating a missing config as `{}`.
fn parse_config<T: DeserializeOwned + ConfigCheck>(
    node: &NodeDefinition,
    node_type: &str,
) -> Result<T, Violation> {
    let invalid = |message: String| Violation::InvalidNodeConfig {
        node_id: node.id.clone(),
        type_name: node_type.to_string(),
        message,
    };
    let raw = if node.config.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        node.config.clone()
    };
    let config: T = serde_json::from_value(raw).map_err(|e| invalid(e.to_string()))?;
    config.check().map_err(invalid)?;
    Ok(config)
}

/// Master macro to define all built-in node parsers, their registration, and their creation.
macro_rules! define_node_parsers {
    ( $( ($struct_name:ident, $node_type:literal, $config:ty, $build:expr) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl NodeParser for $struct_name {
                fn node_type(&self) -> &str { $node_type }
                fn parse(&self, node: &NodeDefinition) -> Result<NodeKind, Violation> {
                    let build: fn($config) -> NodeKind = $build;
                    parse_config::<$config>(node, $node_type).map(build)
                }
            }
        )*

        pub(super) fn register_default_parsers(registry: &mut AHashMap<String, Box<dyn NodeParser>>) {
            $( registry.insert($node_type.to_string(), Box::new($struct_name)); )*
        }

        pub(super) fn create_parser_by_name(name: &str) -> Option<Box<dyn NodeParser>> {
            match name {
                $( $node_type => Some(Box::new($struct_name)), )*
                _ => None,
            }
        }
    };
}

define_node_parsers! {
    (StartParser, "start", StartConfig, NodeKind::Start),
    (TextBubbleParser, "bubble-text", TextBubbleConfig, NodeKind::TextBubble),
    (NumberBubbleParser, "bubble-number", TextBubbleConfig, NodeKind::NumberBubble),
    (ImageBubbleParser, "bubble-image", MediaBubbleConfig,
        |config| NodeKind::MediaBubble { media: MediaKind::Image, config }),
    (VideoBubbleParser, "bubble-video", MediaBubbleConfig,
        |config| NodeKind::MediaBubble { media: MediaKind::Video, config }),
    (AudioBubbleParser, "bubble-audio", MediaBubbleConfig,
        |config| NodeKind::MediaBubble { media: MediaKind::Audio, config }),
    (DocumentBubbleParser, "bubble-document", MediaBubbleConfig,
        |config| NodeKind::MediaBubble { media: MediaKind::Document, config }),
    (TextInputParser, "input-text", InputConfig,
        |config| NodeKind::Input { input: InputKind::Text, config }),
    (NumberInputParser, "input-number", InputConfig,
        |config| NodeKind::Input { input: InputKind::Number, config }),
    (MailInputParser, "input-mail", InputConfig,
        |config| NodeKind::Input { input: InputKind::Mail, config }),
    (PhoneInputParser, "input-phone", InputConfig,
        |config| NodeKind::Input { input: InputKind::Phone, config }),
    (WebsiteInputParser, "input-website", InputConfig,
        |config| NodeKind::Input { input: InputKind::Website, config }),
    (ImageInputParser, "input-image", InputConfig,
        |config| NodeKind::Input { input: InputKind::Image, config }),
    (VideoInputParser, "input-video", InputConfig,
        |config| NodeKind::Input { input: InputKind::Video, config }),
    (AudioInputParser, "input-audio", InputConfig,
        |config| NodeKind::Input { input: InputKind::Audio, config }),
    (DocumentInputParser, "input-document", InputConfig,
        |config| NodeKind::Input { input: InputKind::Document, config }),
    (ButtonsInputParser, "input-buttons", ButtonsConfig, NodeKind::Buttons),
    (SetVariableParser, "set-variable", SetVariableConfig, NodeKind::SetVariable),
    (ConditionParser, "condition", ConditionConfig, NodeKind::Condition),
    (WebhookParser, "webhook", WebhookConfig, NodeKind::Webhook),
    (HttpRequestParser, "http-request", HttpRequestConfig, NodeKind::HttpRequest),
    (ScriptParser, "script", ScriptConfig, NodeKind::Script),
}
