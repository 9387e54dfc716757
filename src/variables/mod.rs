//! Per-session variable storage.
//!
//! Every value is a string. Names are normalized with [`normalize_name`] on
//! the way in and on lookup, so `"{{ name }}"`, `" name "` and `"name"` all
//! address the same variable. Comparison is case-sensitive after
//! normalization.

use crate::compiler::CompiledGraph;
use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Trims the name and strips enclosing `{{ }}` wrappers until none remain.
///
/// `normalize_name(normalize_name(x)) == normalize_name(x)` for every `x`.
pub fn normalize_name(raw: &str) -> &str {
    let mut name = raw.trim();
    while name.len() >= 4 && name.starts_with("{{") && name.ends_with("}}") {
        name = name[2..name.len() - 2].trim();
    }
    name
}

/// Unicode case-insensitive name comparison.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Read access to a set of named string values.
pub trait VariableSource {
    /// Exact lookup of an already-normalized name.
    fn lookup(&self, name: &str) -> Option<&str>;

    /// Case-insensitive lookup. When several names match, the
    /// lexicographically smallest wins so the result never depends on
    /// iteration order.
    fn lookup_ignore_case(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    values: AHashMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a persisted snapshot.
    pub fn from_snapshot(snapshot: BTreeMap<String, String>) -> Self {
        let mut store = Self::new();
        for (name, value) in snapshot {
            store.set(&name, value);
        }
        store
    }

    /// Stores `value` under the normalized `name`. Names that normalize to
    /// the empty string are ignored.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = normalize_name(name);
        if name.is_empty() {
            debug!("Ignoring assignment to a variable with an empty name");
            return;
        }
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(normalize_name(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(normalize_name(name))
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Declares `name` with an empty value unless it already exists.
    /// Returns `true` when the name was newly added.
    pub fn ensure_declared(&mut self, name: &str) -> bool {
        let name = normalize_name(name);
        if name.is_empty() || self.values.contains_key(name) {
            return false;
        }
        self.values.insert(name.to_string(), String::new());
        true
    }

    /// Pre-registers every variable the graph can write, so that rendering a
    /// not-yet-assigned variable yields an empty string. Returns the number
    /// of names newly declared.
    pub fn sync_from_graph(&mut self, graph: &CompiledGraph) -> usize {
        let mut declared = 0;
        for node in graph.nodes() {
            for name in node.kind.produced_variables() {
                if self.ensure_declared(name) {
                    declared += 1;
                }
            }
        }
        debug!(declared, total = self.values.len(), "Synchronized variables from graph");
        declared
    }

    /// An ordered copy of every variable, as persisted and sent to I/O collaborators.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl VariableSource for VariableStore {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn lookup_ignore_case(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .filter(|(key, _)| eq_ignore_case(key, name))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, value)| value.as_str())
    }
}

impl VariableSource for AHashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str).or_else(|| {
            self.iter()
                .filter(|(key, _)| normalize_name(key) == name)
                .min_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, value)| value.as_str())
        })
    }

    fn lookup_ignore_case(&self, name: &str) -> Option<&str> {
        self.iter()
            .filter(|(key, _)| eq_ignore_case(normalize_name(key), name))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, value)| value.as_str())
    }
}

impl VariableSource for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str).or_else(|| {
            self.iter()
                .find(|(key, _)| normalize_name(key) == name)
                .map(|(_, value)| value.as_str())
        })
    }

    fn lookup_ignore_case(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| eq_ignore_case(normalize_name(key), name))
            .map(|(_, value)| value.as_str())
    }
}
