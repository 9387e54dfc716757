use crate::workspace::{Node, NodeKind};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// A container after compilation: its nodes are typed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: String,
    pub name: Option<String>,
    pub nodes: Vec<Node>,
}

/// The immutable, validated form of a workspace.
///
/// A compiled graph is never mutated after `Compiler::compile` returns it, so
/// one instance (usually behind an `Arc`) can be shared by every session.
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    pub(super) name: String,
    pub(super) version: String,
    pub(super) containers: Vec<Container>,
    pub(super) container_index: AHashMap<String, usize>,
    /// `(source container, handle) -> target container`
    pub(super) edges: AHashMap<(usize, Option<String>), usize>,
    pub(super) start: usize,
    pub(super) unreachable: Vec<String>,
}

impl CompiledGraph {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared version, or the definition's content fingerprint.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn container(&self, index: usize) -> Option<&Container> {
        self.containers.get(index)
    }

    pub fn container_position(&self, id: &str) -> Option<usize> {
        self.container_index.get(id).copied()
    }

    pub fn container_by_id(&self, id: &str) -> Option<&Container> {
        self.container_position(id)
            .and_then(|index| self.containers.get(index))
    }

    /// Index of the container holding the start node.
    pub fn start_container(&self) -> usize {
        self.start
    }

    pub fn start_config(&self) -> Option<&crate::workspace::StartConfig> {
        self.containers
            .get(self.start)
            .and_then(|container| container.nodes.first())
            .and_then(|node| match &node.kind {
                NodeKind::Start(config) => Some(config),
                _ => None,
            })
    }

    /// The container an edge leaving `container` through `handle` enters.
    /// `None` as handle means the container's unconditional edge.
    pub fn edge_target(&self, container: usize, handle: Option<&str>) -> Option<usize> {
        self.edges
            .get(&(container, handle.map(str::to_string)))
            .copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Every node of every container, in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.containers.iter().flat_map(|c| c.nodes.iter())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes().find(|node| node.id == id)
    }

    /// Ids of containers that no chain of edges from the start container reaches.
    pub fn unreachable_containers(&self) -> &[String] {
        &self.unreachable
    }

    /// Breadth-first walk over container edges from the start container.
    pub(super) fn find_unreachable(
        containers: &[Container],
        edges: &AHashMap<(usize, Option<String>), usize>,
        start: usize,
    ) -> Vec<String> {
        let mut adjacency: AHashMap<usize, Vec<usize>> = AHashMap::new();
        for ((source, _), target) in edges {
            adjacency.entry(*source).or_default().push(*target);
        }

        let mut visited = AHashSet::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(current) = queue.pop_front() {
            for next in adjacency.get(&current).into_iter().flatten() {
                if visited.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }

        containers
            .iter()
            .enumerate()
            .filter(|(index, _)| !visited.contains(index))
            .map(|(_, container)| container.id.clone())
            .collect()
    }
}
