use crate::error::{CompileError, ValidationErrors, Violation};
use crate::workspace::{IntoWorkspace, Node, NodeKind, WorkspaceDefinition};
use ahash::{AHashMap, AHashSet};
use tracing::{debug, warn};

mod graph;
pub mod parsing;

pub use graph::{CompiledGraph, Container};
use parsing::*;

/// Validates a `WorkspaceDefinition` and compiles it into a `CompiledGraph`.
pub struct Compiler {
    definition: WorkspaceDefinition,
    registry: AHashMap<String, Box<dyn NodeParser>>,
}

pub struct CompilerBuilder {
    definition: WorkspaceDefinition,
    registry: AHashMap<String, Box<dyn NodeParser>>,
}

impl CompilerBuilder {
    pub fn new(definition: WorkspaceDefinition) -> Self {
        let mut registry: AHashMap<String, Box<dyn NodeParser>> = AHashMap::new();
        register_default_parsers(&mut registry);
        Self {
            definition,
            registry,
        }
    }

    /// Lets nodes of `user_type_name` be parsed like the built-in `builtin_type_name`.
    /// Unknown built-in names are ignored.
    pub fn with_type_mapping(mut self, user_type_name: &str, builtin_type_name: &str) -> Self {
        if let Some(parser) = create_parser_by_name(builtin_type_name) {
            self.registry.insert(user_type_name.to_string(), parser);
        }
        self
    }

    pub fn with_custom_parser(mut self, parser: Box<dyn NodeParser>) -> Self {
        self.registry.insert(parser.node_type().to_string(), parser);
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            definition: self.definition,
            registry: self.registry,
        }
    }
}

/// A start node found while scanning containers.
struct StartNode {
    node_id: String,
    container_id: String,
    position: usize,
}

impl Compiler {
    pub fn builder(definition: WorkspaceDefinition) -> CompilerBuilder {
        CompilerBuilder::new(definition)
    }

    pub fn new(definition: WorkspaceDefinition) -> Self {
        CompilerBuilder::new(definition).build()
    }

    /// Builds a compiler from any format that converts into a workspace.
    pub fn from_source(source: impl IntoWorkspace) -> Result<Self, CompileError> {
        Ok(Self::new(source.into_workspace()?))
    }

    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        Ok(Self::new(WorkspaceDefinition::from_json(json)?))
    }

    /// Validates the workspace and compiles it.
    ///
    /// On failure, the returned `ValidationErrors` lists every violation
    /// found, not just the first.
    pub fn compile(self) -> Result<CompiledGraph, CompileError> {
        let definition = &self.definition;
        let version = definition
            .version
            .clone()
            .unwrap_or_else(|| definition.fingerprint());

        let mut violations = Vec::new();
        let mut containers = Vec::with_capacity(definition.containers.len());
        let mut container_index: AHashMap<String, usize> = AHashMap::new();
        let mut container_handles: Vec<AHashSet<String>> = Vec::new();
        let mut seen_nodes: AHashSet<&str> = AHashSet::new();
        let mut start_nodes: Vec<StartNode> = Vec::new();

        for container_def in &definition.containers {
            let duplicate = container_index.contains_key(&container_def.id);
            if duplicate {
                violations.push(Violation::DuplicateContainerId(container_def.id.clone()));
            }
            if container_def.nodes.is_empty() {
                violations.push(Violation::EmptyContainer(container_def.id.clone()));
            }

            let mut nodes = Vec::with_capacity(container_def.nodes.len());
            let mut handles = AHashSet::new();
            for (position, node_def) in container_def.nodes.iter().enumerate() {
                if !seen_nodes.insert(node_def.id.as_str()) {
                    violations.push(Violation::DuplicateNodeId {
                        node_id: node_def.id.clone(),
                        container_id: container_def.id.clone(),
                    });
                    continue;
                }

                let Some(parser) = self.registry.get(&node_def.node_type) else {
                    violations.push(Violation::InvalidNodeType {
                        node_id: node_def.id.clone(),
                        type_name: node_def.node_type.clone(),
                    });
                    continue;
                };

                let parsed = parser.parse(node_def);
                // A start node with a broken config still counts as the start.
                let is_start = match &parsed {
                    Ok(kind) => matches!(kind, NodeKind::Start(_)),
                    Err(_) => parser.node_type() == "start",
                };
                if is_start {
                    start_nodes.push(StartNode {
                        node_id: node_def.id.clone(),
                        container_id: container_def.id.clone(),
                        position,
                    });
                }

                let kind = match parsed {
                    Ok(kind) => kind,
                    Err(violation) => {
                        violations.push(violation);
                        continue;
                    }
                };

                let node = Node {
                    id: node_def.id.clone(),
                    kind,
                };
                let mut node_handles = vec![node.id.clone()];
                if node.kind.io_kind().is_some() {
                    node_handles.push(node.failure_handle());
                }
                node_handles.extend(node.kind.branch_handles().into_iter().map(str::to_string));
                for handle in node_handles {
                    if handles.contains(&handle) {
                        violations.push(Violation::DuplicateHandle {
                            container_id: container_def.id.clone(),
                            handle,
                        });
                    } else {
                        handles.insert(handle);
                    }
                }
                nodes.push(node);
            }

            if !duplicate {
                container_index.insert(container_def.id.clone(), containers.len());
                containers.push(Container {
                    id: container_def.id.clone(),
                    name: container_def.name.clone(),
                    nodes,
                });
                container_handles.push(handles);
            }
        }

        match start_nodes.as_slice() {
            [] => violations.push(Violation::MissingStartNode),
            [start] if start.position != 0 => violations.push(Violation::StartNodeNotFirst {
                node_id: start.node_id.clone(),
                container_id: start.container_id.clone(),
            }),
            [_] => {}
            many => violations.push(Violation::MultipleStartNodes(
                many.iter().map(|s| s.node_id.clone()).collect(),
            )),
        }

        let mut edges: AHashMap<(usize, Option<String>), usize> = AHashMap::new();
        for (index, edge) in definition.edges.iter().enumerate() {
            let source = container_index.get(&edge.source).copied();
            let target = container_index.get(&edge.target).copied();
            let mut resolvable = true;

            if source.is_none() {
                violations.push(Violation::UnknownEdgeSource {
                    edge: edge.label(index),
                    container_id: edge.source.clone(),
                });
                resolvable = false;
            }
            if target.is_none() {
                violations.push(Violation::UnknownEdgeTarget {
                    edge: edge.label(index),
                    container_id: edge.target.clone(),
                });
                resolvable = false;
            }
            if let (Some(source), Some(handle)) = (source, &edge.source_handle) {
                if !container_handles[source].contains(handle) {
                    violations.push(Violation::UnresolvedSourceHandle {
                        edge: edge.label(index),
                        container_id: edge.source.clone(),
                        handle: handle.clone(),
                    });
                    resolvable = false;
                }
            }

            if let (true, Some(source), Some(target)) = (resolvable, source, target) {
                let key = (source, edge.source_handle.clone());
                if edges.contains_key(&key) {
                    violations.push(Violation::DuplicateEdge {
                        container_id: edge.source.clone(),
                        handle: edge.source_handle.clone(),
                    });
                } else {
                    edges.insert(key, target);
                }
            }
        }

        if !violations.is_empty() {
            warn!(
                workspace = %definition.name,
                violations = violations.len(),
                "Workspace failed validation"
            );
            return Err(ValidationErrors { violations }.into());
        }

        // Exactly one start node exists at this point.
        let start = start_nodes
            .first()
            .and_then(|s| container_index.get(&s.container_id).copied())
            .unwrap_or_default();

        let unreachable = CompiledGraph::find_unreachable(&containers, &edges, start);
        for container_id in &unreachable {
            warn!(
                workspace = %definition.name,
                container = %container_id,
                "Container is unreachable from the start node"
            );
        }

        debug!(
            workspace = %definition.name,
            version = %version,
            containers = containers.len(),
            edges = edges.len(),
            "Compiled workspace"
        );

        Ok(CompiledGraph {
            name: definition.name.clone(),
            version,
            containers,
            container_index,
            edges,
            start,
            unreachable,
        })
    }
}
