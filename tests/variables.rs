//! Tests for the per-session variable store.
mod common;
use chatflow::prelude::*;
use chatflow::variables::normalize_name;
use common::*;
use serde_json::json;
use std::collections::BTreeMap;

#[test]
fn test_names_are_normalized_on_write_and_read() {
    let mut store = VariableStore::new();
    store.set("{{ city }}", "Lyon");
    assert_eq!(store.get("city"), Some("Lyon"));
    assert_eq!(store.get(" {{city}} "), Some("Lyon"));
    assert!(store.contains("{{{{city}}}}"));
    assert_eq!(store.get("City"), None, "lookups are case-sensitive");
    assert_eq!(normalize_name(" {{ {{ city }} }} "), "city");
}

#[test]
fn test_ensure_declared_never_overwrites() {
    let mut store = VariableStore::new();
    store.set("name", "Alice");
    assert!(!store.ensure_declared("{{name}}"));
    assert_eq!(store.get("name"), Some("Alice"));

    assert!(store.ensure_declared("email"));
    assert_eq!(store.get("email"), Some(""));
    assert!(!store.ensure_declared("email"));
}

#[test]
fn test_sync_from_graph_declares_every_produced_variable() {
    let definition = workspace(
        vec![container(
            "c1",
            vec![
                node(
                    "start",
                    "start",
                    json!({ "initialVariables": [{ "name": "lang", "defaultValue": "en" }] }),
                ),
                node("ask", "input-mail", json!({ "saveVariable": "{{ email }}" })),
                node(
                    "menu",
                    "input-buttons",
                    json!({
                        "saveVariable": "plan",
                        "buttons": [{ "id": "b1", "label": "Pro", "saveVariable": "isPro" }]
                    }),
                ),
                node("assign", "set-variable", json!({ "variableName": "total", "value": "1" })),
                node("hook", "webhook", json!({ "saveVariable": "reply" })),
                node("run", "script", json!({ "code": "return 1", "saveVariable": "result" })),
            ],
        )],
        vec![],
    );
    let graph = compile(definition);

    let mut store = VariableStore::new();
    store.set("plan", "free");
    let declared = store.sync_from_graph(&graph);

    assert_eq!(declared, 6);
    assert_eq!(store.get("plan"), Some("free"));
    let names: Vec<String> = store.names().into_iter().collect();
    assert_eq!(
        names,
        vec!["email", "isPro", "lang", "plan", "reply", "result", "total"]
    );
}

#[test]
fn test_snapshot_round_trips_through_from_snapshot() {
    let mut store = VariableStore::new();
    store.set("b", "2");
    store.set("a", "1");
    let snapshot = store.snapshot();
    assert_eq!(
        snapshot,
        BTreeMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string())
        ])
    );
    assert_eq!(VariableStore::from_snapshot(snapshot), store);
}
