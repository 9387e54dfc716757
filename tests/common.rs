//! Common test utilities for building workspace definitions and sessions.
use chatflow::prelude::*;
use chatflow::workspace::{ContainerDefinition, EdgeDefinition, NodeDefinition};
use serde_json::{Value, json};

#[allow(dead_code)]
pub fn node(id: &str, node_type: &str, config: Value) -> NodeDefinition {
    NodeDefinition::new(id, node_type, config)
}

#[allow(dead_code)]
pub fn start() -> NodeDefinition {
    node("start", "start", json!({}))
}

#[allow(dead_code)]
pub fn text(id: &str, content: &str) -> NodeDefinition {
    node(id, "bubble-text", json!({ "content": content }))
}

#[allow(dead_code)]
pub fn container(id: &str, nodes: Vec<NodeDefinition>) -> ContainerDefinition {
    ContainerDefinition {
        id: id.to_string(),
        nodes,
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn edge(source: &str, handle: Option<&str>, target: &str) -> EdgeDefinition {
    EdgeDefinition::new(source, handle, target)
}

#[allow(dead_code)]
pub fn workspace(
    containers: Vec<ContainerDefinition>,
    edges: Vec<EdgeDefinition>,
) -> WorkspaceDefinition {
    WorkspaceDefinition {
        name: "test".to_string(),
        version: Some("1".to_string()),
        containers,
        edges,
    }
}

#[allow(dead_code)]
pub fn compile(definition: WorkspaceDefinition) -> CompiledGraph {
    Compiler::new(definition)
        .compile()
        .expect("Failed to compile workspace")
}

#[allow(dead_code)]
pub fn executor(definition: WorkspaceDefinition) -> Executor {
    Executor::new(compile(definition))
}

/// Collects the text of every render event, in order.
#[allow(dead_code)]
pub fn texts(events: &[OutboundEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.rendered_text().map(str::to_string))
        .collect()
}

#[allow(dead_code)]
pub fn termination(events: &[OutboundEvent]) -> Option<TerminationReason> {
    events.iter().find_map(|e| e.termination().cloned())
}

/// Greets the user, asks for a name and branches on it.
///
/// Logic: `name equals "Bob"` -> "Bob detected"; otherwise the condition's
/// own exit edge leads to "Unknown".
#[allow(dead_code)]
pub fn create_greeting_workspace() -> WorkspaceDefinition {
    workspace(
        vec![
            container(
                "c-main",
                vec![
                    node(
                        "start",
                        "start",
                        json!({ "initialVariables": [{ "name": "name", "defaultValue": "" }] }),
                    ),
                    text("greet", "Hi {{name}}"),
                    node("ask-name", "input-text", json!({ "saveVariable": "name" })),
                    node(
                        "check",
                        "condition",
                        json!({
                            "groups": [{
                                "id": "is-bob",
                                "logicalOperator": "AND",
                                "comparisons": [
                                    { "variableName": "name", "operator": "equals", "value": "Bob" }
                                ]
                            }]
                        }),
                    ),
                ],
            ),
            container("c-bob", vec![text("bob", "Bob detected")]),
            container("c-unknown", vec![text("unknown", "Unknown")]),
        ],
        vec![
            edge("c-main", Some("is-bob"), "c-bob"),
            edge("c-main", Some("check"), "c-unknown"),
        ],
    )
}

/// A condition with no default continuation: anything but "yes" is a dead end.
#[allow(dead_code)]
pub fn create_dead_end_workspace() -> WorkspaceDefinition {
    workspace(
        vec![
            container(
                "c-main",
                vec![
                    start(),
                    node("answer", "input-text", json!({ "saveVariable": "answer" })),
                    node(
                        "check",
                        "condition",
                        json!({
                            "groups": [{
                                "id": "said-yes",
                                "comparisons": [
                                    { "variableName": "answer", "operator": "equals", "value": "yes" }
                                ]
                            }]
                        }),
                    ),
                ],
            ),
            container("c-yes", vec![text("done", "Great")]),
        ],
        vec![edge("c-main", Some("said-yes"), "c-yes")],
    )
}

/// A button menu whose buttons branch to separate containers.
#[allow(dead_code)]
pub fn create_menu_workspace(multiple_choice: bool) -> WorkspaceDefinition {
    workspace(
        vec![
            container(
                "c-main",
                vec![
                    start(),
                    node(
                        "menu",
                        "input-buttons",
                        json!({
                            "saveVariable": "choice",
                            "isMultipleChoice": multiple_choice,
                            "buttons": [
                                { "id": "b-tea", "label": "Tea", "saveVariable": "wantsTea" },
                                { "id": "b-coffee", "label": "Coffee", "value": "espresso" }
                            ]
                        }),
                    ),
                ],
            ),
            container("c-tea", vec![text("tea", "One tea coming up")]),
            container("c-coffee", vec![text("coffee", "Brewing {{choice}}")]),
            container("c-other", vec![text("other", "Got {{choice}}")]),
        ],
        vec![
            edge("c-main", Some("b-tea"), "c-tea"),
            edge("c-main", Some("b-coffee"), "c-coffee"),
            edge("c-main", None, "c-other"),
        ],
    )
}

/// Calls a webhook, stores its result and reports it; failures branch away.
#[allow(dead_code)]
pub fn create_webhook_workspace(with_failure_edge: bool) -> WorkspaceDefinition {
    let mut edges = Vec::new();
    if with_failure_edge {
        edges.push(edge("c-main", Some("hook:failure"), "c-failed"));
    }
    workspace(
        vec![
            container(
                "c-main",
                vec![
                    node(
                        "start",
                        "start",
                        json!({ "initialVariables": [{ "name": "user", "defaultValue": "42" }] }),
                    ),
                    node(
                        "hook",
                        "webhook",
                        json!({ "url": "https://api.test/users/{{user}}", "saveVariable": "status" }),
                    ),
                    text("report", "Status: {{status}}"),
                ],
            ),
            container("c-failed", vec![text("sorry", "Something went wrong")]),
        ],
        edges,
    )
}
