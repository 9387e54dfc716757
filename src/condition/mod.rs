//! Boolean comparison groups evaluated against a session's variables.

use crate::trace::EvaluationTrace;
use crate::variables::VariableStore;
use serde::{Deserialize, Serialize};
use std::fmt;

mod engine;

use engine::ConditionEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl LogicalOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    IsSet,
    IsEmpty,
    MatchesRegex,
    NotMatchesRegex,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "equals",
            ComparisonOperator::NotEquals => "not_equals",
            ComparisonOperator::Contains => "contains",
            ComparisonOperator::NotContains => "not_contains",
            ComparisonOperator::StartsWith => "starts_with",
            ComparisonOperator::EndsWith => "ends_with",
            ComparisonOperator::GreaterThan => "greater_than",
            ComparisonOperator::LessThan => "less_than",
            ComparisonOperator::IsSet => "is_set",
            ComparisonOperator::IsEmpty => "is_empty",
            ComparisonOperator::MatchesRegex => "matches_regex",
            ComparisonOperator::NotMatchesRegex => "not_matches_regex",
        }
    }

    /// Whether the operator compares against a `value` operand.
    pub fn takes_value(&self) -> bool {
        !matches!(self, ComparisonOperator::IsSet | ComparisonOperator::IsEmpty)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionComparison {
    pub variable_name: String,
    pub operator: ComparisonOperator,
    /// Template text; `{{name}}` references are rendered before comparing.
    /// Regex patterns are used as written.
    #[serde(default)]
    pub value: Option<String>,
}

impl ConditionComparison {
    pub fn new(variable_name: &str, operator: ComparisonOperator, value: Option<&str>) -> Self {
        Self {
            variable_name: variable_name.to_string(),
            operator,
            value: value.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub id: String,
    #[serde(default)]
    pub logical_operator: LogicalOperator,
    #[serde(default)]
    pub comparisons: Vec<ConditionComparison>,
}

impl ConditionGroup {
    pub fn new(
        id: &str,
        logical_operator: LogicalOperator,
        comparisons: Vec<ConditionComparison>,
    ) -> Self {
        Self {
            id: id.to_string(),
            logical_operator,
            comparisons,
        }
    }
}

/// Evaluates a group against the store.
///
/// An empty AND group is vacuously true; an empty OR group is false.
pub fn evaluate(group: &ConditionGroup, store: &VariableStore) -> bool {
    evaluate_traced(group, store).outcome()
}

/// Evaluates a group and returns the trace explaining the outcome.
pub fn evaluate_traced(group: &ConditionGroup, store: &VariableStore) -> EvaluationTrace {
    ConditionEngine::new(store).evaluate_group(group)
}

/// Returns the first group in declaration order that evaluates to true,
/// along with the traces of every group that was evaluated.
pub fn select_group<'g>(
    groups: &'g [ConditionGroup],
    store: &VariableStore,
) -> (Option<&'g ConditionGroup>, Vec<EvaluationTrace>) {
    let engine = ConditionEngine::new(store);
    let mut traces = Vec::new();
    for group in groups {
        let trace = engine.evaluate_group(group);
        let matched = trace.outcome();
        traces.push(trace);
        if matched {
            return (Some(group), traces);
        }
    }
    (None, traces)
}
