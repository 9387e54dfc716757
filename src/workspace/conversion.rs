use super::definition::WorkspaceDefinition;
use crate::error::WorkspaceConversionError;

/// A trait for custom editor models that can be converted into a `WorkspaceDefinition`.
///
/// Editors that export their own document shape implement this to hand the
/// compiler a canonical definition without going through JSON.
///
/// # Example
///
/// ```rust,no_run
/// use chatflow::error::WorkspaceConversionError;
/// use chatflow::workspace::{
///     ContainerDefinition, IntoWorkspace, NodeDefinition, WorkspaceDefinition,
/// };
///
/// struct Script {
///     title: String,
///     lines: Vec<String>,
/// }
///
/// impl IntoWorkspace for Script {
///     fn into_workspace(self) -> Result<WorkspaceDefinition, WorkspaceConversionError> {
///         if self.lines.is_empty() {
///             return Err(WorkspaceConversionError::ValidationError(
///                 "script has no lines".to_string(),
///             ));
///         }
///         let mut nodes = vec![NodeDefinition::new("start", "start", serde_json::json!({}))];
///         for (i, line) in self.lines.into_iter().enumerate() {
///             nodes.push(NodeDefinition::new(
///                 &format!("line-{}", i),
///                 "bubble-text",
///                 serde_json::json!({ "content": line }),
///             ));
///         }
///         Ok(WorkspaceDefinition {
///             name: self.title,
///             version: None,
///             containers: vec![ContainerDefinition {
///                 id: "main".to_string(),
///                 nodes,
///                 ..Default::default()
///             }],
///             edges: vec![],
///         })
///     }
/// }
/// ```
pub trait IntoWorkspace {
    /// Consumes the object and converts it into a compilable workspace definition.
    fn into_workspace(self) -> Result<WorkspaceDefinition, WorkspaceConversionError>;
}

impl IntoWorkspace for WorkspaceDefinition {
    fn into_workspace(self) -> Result<WorkspaceDefinition, WorkspaceConversionError> {
        Ok(self)
    }
}

impl IntoWorkspace for serde_json::Value {
    fn into_workspace(self) -> Result<WorkspaceDefinition, WorkspaceConversionError> {
        serde_json::from_value(self)
            .map_err(|e| WorkspaceConversionError::ValidationError(e.to_string()))
    }
}
