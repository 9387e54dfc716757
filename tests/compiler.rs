//! Tests for workspace validation and compilation.
mod common;
use chatflow::compiler::parsing::NodeParser;
use chatflow::error::Violation;
use chatflow::prelude::*;
use chatflow::workspace::{NodeDefinition, NodeKind, NodeType};
use common::*;
use serde_json::json;

fn violations(definition: WorkspaceDefinition) -> ValidationErrors {
    match Compiler::new(definition).compile() {
        Err(CompileError::Validation(errors)) => errors,
        Err(other) => panic!("Expected validation errors, got {:?}", other),
        Ok(_) => panic!("Expected compilation to fail"),
    }
}

#[test]
fn test_compiler_builds_greeting_workspace() {
    let graph = compile(create_greeting_workspace());

    assert_eq!(graph.name(), "test");
    assert_eq!(graph.version(), "1");
    assert_eq!(graph.containers().len(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.unreachable_containers().is_empty());

    let check = graph.node("check").expect("condition node exists");
    assert_eq!(check.node_type(), NodeType::Condition);
    match &check.kind {
        NodeKind::Condition(config) => assert_eq!(config.groups[0].id, "is-bob"),
        other => panic!("Expected a condition, got {:?}", other),
    }

    let main = graph.container_position("c-main").unwrap();
    let bob = graph.container_position("c-bob").unwrap();
    assert_eq!(graph.start_container(), main);
    assert_eq!(graph.edge_target(main, Some("is-bob")), Some(bob));
    assert_eq!(graph.edge_target(main, None), None);

    let bob_container = graph.container_by_id("c-bob").expect("c-bob exists");
    assert_eq!(bob_container.nodes[0].id, "bob");
    assert!(graph.container_by_id("c-missing").is_none());
}

#[test]
fn test_compiler_parses_workspace_json() {
    let json = r#"{
        "name": "from json",
        "containers": [
            { "id": "c1", "position": { "x": 10.0, "y": 20.0 }, "nodes": [
                { "id": "s", "type": "start" },
                { "id": "t", "type": "bubble-text", "config": { "content": "Hello" } }
            ] }
        ],
        "edges": []
    }"#;
    let graph = Compiler::from_json(json).unwrap().compile().unwrap();
    assert_eq!(graph.name(), "from json");
    // No declared version: a content fingerprint stands in.
    assert_eq!(graph.version().len(), 64);
    assert!(graph.version().chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_fingerprint_is_stable_and_content_sensitive() {
    let mut a = create_greeting_workspace();
    a.version = None;
    let b = a.clone();
    assert_eq!(compile(a.clone()).version(), compile(b).version());

    let mut c = a.clone();
    c.containers[1].nodes[0] = text("bob", "Bob spotted");
    assert_ne!(compile(a).version(), compile(c).version());
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let result = Compiler::from_json("{ not json");
    assert!(matches!(result, Err(CompileError::JsonParseError(_))));
}

#[test]
fn test_every_violation_is_reported() {
    let definition = workspace(
        vec![
            container("c1", vec![text("t1", "first"), start()]),
            container("c1", vec![text("t2", "dup container")]),
            container("c2", vec![]),
            container(
                "c3",
                vec![
                    text("t1", "duplicate node id"),
                    node("odd", "not-a-type", json!({})),
                    node("bad", "input-buttons", json!({ "buttons": [] })),
                ],
            ),
        ],
        vec![
            edge("c1", None, "nowhere"),
            edge("ghost", None, "c1"),
            edge("c1", Some("no-such-handle"), "c3"),
        ],
    );

    let errors = violations(definition);
    assert!(errors.contains(&Violation::DuplicateContainerId("c1".to_string())));
    assert!(errors.contains(&Violation::EmptyContainer("c2".to_string())));
    assert!(errors.contains(&Violation::DuplicateNodeId {
        node_id: "t1".to_string(),
        container_id: "c3".to_string(),
    }));
    assert!(errors.contains(&Violation::InvalidNodeType {
        node_id: "odd".to_string(),
        type_name: "not-a-type".to_string(),
    }));
    assert!(errors.contains(&Violation::StartNodeNotFirst {
        node_id: "start".to_string(),
        container_id: "c1".to_string(),
    }));
    assert!(errors.contains(&Violation::UnknownEdgeTarget {
        edge: "#0".to_string(),
        container_id: "nowhere".to_string(),
    }));
    assert!(errors.contains(&Violation::UnknownEdgeSource {
        edge: "#1".to_string(),
        container_id: "ghost".to_string(),
    }));
    assert!(errors.contains(&Violation::UnresolvedSourceHandle {
        edge: "#2".to_string(),
        container_id: "c1".to_string(),
        handle: "no-such-handle".to_string(),
    }));
    assert!(errors.iter().any(|v| matches!(
        v,
        Violation::InvalidNodeConfig { node_id, .. } if node_id == "bad"
    )));
    assert_eq!(errors.len(), 9);
}

#[test]
fn test_start_node_count_is_enforced() {
    let none = workspace(vec![container("c1", vec![text("t", "hi")])], vec![]);
    assert_eq!(violations(none).violations, vec![Violation::MissingStartNode]);

    let two = workspace(
        vec![
            container("c1", vec![start()]),
            container("c2", vec![node("start-2", "start", json!({}))]),
        ],
        vec![edge("c1", None, "c2")],
    );
    assert_eq!(
        violations(two).violations,
        vec![Violation::MultipleStartNodes(vec![
            "start".to_string(),
            "start-2".to_string()
        ])]
    );
}

#[test]
fn test_start_node_with_broken_config_still_counts_as_start() {
    let definition = workspace(
        vec![container(
            "c1",
            vec![
                node("start", "start", json!({ "initialVariables": 5 })),
                text("t", "hi"),
            ],
        )],
        vec![],
    );
    let errors = violations(definition);
    assert_eq!(errors.violations.len(), 1, "{}", errors);
    assert!(matches!(
        &errors.violations[0],
        Violation::InvalidNodeConfig { node_id, .. } if node_id == "start"
    ));
}

#[test]
fn test_duplicate_edges_for_one_handle_are_rejected() {
    let definition = workspace(
        vec![
            container("c1", vec![start()]),
            container("c2", vec![text("a", "a")]),
            container("c3", vec![text("b", "b")]),
        ],
        vec![edge("c1", None, "c2"), edge("c1", None, "c3")],
    );
    assert_eq!(
        violations(definition).violations,
        vec![Violation::DuplicateEdge {
            container_id: "c1".to_string(),
            handle: None,
        }]
    );
}

#[test]
fn test_branch_handle_colliding_with_node_id_is_rejected() {
    let definition = workspace(
        vec![container(
            "c1",
            vec![
                start(),
                node(
                    "menu",
                    "input-buttons",
                    json!({ "buttons": [{ "id": "start", "label": "Again" }] }),
                ),
            ],
        )],
        vec![],
    );
    assert_eq!(
        violations(definition).violations,
        vec![Violation::DuplicateHandle {
            container_id: "c1".to_string(),
            handle: "start".to_string(),
        }]
    );
}

#[test]
fn test_invalid_configs_are_rejected() {
    let definition = workspace(
        vec![container(
            "c1",
            vec![
                start(),
                node("age", "input-number", json!({ "min": 10, "max": 1 })),
                node("assign", "set-variable", json!({ "variableName": "{{ }}" })),
                node("call", "http-request", json!({ "url": "  " })),
                node("missing", "bubble-text", json!({})),
            ],
        )],
        vec![],
    );
    let errors = violations(definition);
    let failing: Vec<&str> = errors
        .iter()
        .filter_map(|v| match v {
            Violation::InvalidNodeConfig { node_id, .. } => Some(node_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(failing, vec!["age", "assign", "call", "missing"]);
}

#[test]
fn test_failure_handles_exist_only_for_io_nodes() {
    let io = create_webhook_workspace(true);
    assert!(Compiler::new(io).compile().is_ok());

    let definition = workspace(
        vec![
            container("c1", vec![start(), text("t", "hi")]),
            container("c2", vec![text("u", "there")]),
        ],
        vec![edge("c1", Some("t:failure"), "c2")],
    );
    let errors = violations(definition);
    assert!(matches!(
        &errors.violations[..],
        [Violation::UnresolvedSourceHandle { handle, .. }] if handle == "t:failure"
    ));
}

#[test]
fn test_unreachable_containers_are_reported_but_allowed() {
    let graph = compile(create_webhook_workspace(false));
    assert_eq!(graph.unreachable_containers(), &["c-failed".to_string()]);
}

#[test]
fn test_compiler_with_type_mapping() {
    let mut definition = create_greeting_workspace();
    definition.containers[1].nodes[0].node_type = "say".to_string();

    let result = Compiler::builder(definition.clone()).build().compile();
    assert!(result.is_err(), "Unmapped type should fail");

    let graph = Compiler::builder(definition)
        .with_type_mapping("say", "bubble-text")
        .build()
        .compile()
        .expect("Compilation should succeed with type mapping");
    assert_eq!(graph.node("bob").unwrap().node_type(), NodeType::BubbleText);
}

#[test]
fn test_compiler_with_custom_parser() {
    struct ShoutParser;
    impl NodeParser for ShoutParser {
        fn node_type(&self) -> &str {
            "shout"
        }
        fn parse(&self, node: &NodeDefinition) -> std::result::Result<NodeKind, Violation> {
            let content = node.config["words"].as_str().unwrap_or_default().to_uppercase();
            Ok(NodeKind::TextBubble(chatflow::workspace::TextBubbleConfig { content }))
        }
    }

    let definition = workspace(
        vec![container(
            "c1",
            vec![start(), node("loud", "shout", json!({ "words": "hello {{name}}" }))],
        )],
        vec![],
    );
    let graph = Compiler::builder(definition)
        .with_custom_parser(Box::new(ShoutParser))
        .build()
        .compile()
        .unwrap();
    match &graph.node("loud").unwrap().kind {
        NodeKind::TextBubble(config) => assert_eq!(config.content, "HELLO {{NAME}}"),
        other => panic!("Expected a text bubble, got {:?}", other),
    }
}
