//! Variable interpolation and link extraction for outgoing text.
//!
//! Grammar, scanned left to right with the first match winning and no
//! nesting:
//!
//! * `{{ name }}`: a variable reference; the inner name is trimmed.
//! * `[label](url)`: a link.
//! * anything else: literal text.

use crate::variables::{VariableSource, VariableStore, normalize_name};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

mod render;
mod scanner;

pub use render::{Scope, normalize_url};
pub use scanner::parse;

/// A parsed chunk of template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal { text: String },
    Variable { raw: String, name: String },
    Link { raw: String, label: String, url: String },
}

impl Segment {
    /// The exact source text this segment was parsed from.
    pub fn raw(&self) -> &str {
        match self {
            Segment::Literal { text } => text,
            Segment::Variable { raw, .. } => raw,
            Segment::Link { raw, .. } => raw,
        }
    }
}

/// Output of rich rendering: variables substituted, links kept structured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RichSegment {
    Text { text: String },
    Link { label: String, url: String },
}

/// A parsed template, reusable across renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> Self {
        Self {
            segments: parse(text),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Normalized names of every variable referenced, in order of appearance.
    pub fn variable_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable { name, .. } => Some(normalize_name(name)),
                _ => None,
            })
            .collect()
    }

    /// Substitutes variables; link tokens are kept verbatim.
    pub fn render(&self, scope: &Scope<'_>) -> String {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Variable { name, .. } => output.push_str(scope.resolve(name)),
                other => output.push_str(other.raw()),
            }
        }
        output
    }

    /// Substitutes variables and returns links as separate segments with
    /// normalized URLs. Adjacent text is merged.
    pub fn render_rich(&self, scope: &Scope<'_>) -> Vec<RichSegment> {
        let mut output: Vec<RichSegment> = Vec::new();
        for segment in &self.segments {
            let piece = match segment {
                Segment::Literal { text } => text.as_str(),
                Segment::Variable { name, .. } => scope.resolve(name),
                Segment::Link { label, url, .. } => {
                    output.push(RichSegment::Link {
                        label: label.clone(),
                        url: normalize_url(url),
                    });
                    continue;
                }
            };
            if piece.is_empty() {
                continue;
            }
            match output.last_mut() {
                Some(RichSegment::Text { text }) => text.push_str(piece),
                _ => output.push(RichSegment::Text {
                    text: piece.to_string(),
                }),
            }
        }
        output
    }
}

/// Renders `text` against `store`, with `overrides` taking precedence for
/// the same name. Unknown variables render as the empty string.
pub fn render(text: &str, store: &VariableStore, overrides: &dyn VariableSource) -> String {
    Template::parse(text).render(&Scope::new(store).with_overrides(overrides))
}

/// Renders `text` against `store` alone.
pub fn render_plain(text: &str, store: &VariableStore) -> String {
    Template::parse(text).render(&Scope::new(store))
}

/// Rich rendering of `text` against `store`.
pub fn render_rich(text: &str, store: &VariableStore) -> Vec<RichSegment> {
    Template::parse(text).render_rich(&Scope::new(store))
}

/// An empty override set, for callers that have none.
pub fn no_overrides() -> AHashMap<String, String> {
    AHashMap::new()
}
