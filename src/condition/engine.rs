use super::{ComparisonOperator, ConditionComparison, ConditionGroup, LogicalOperator};
use crate::text;
use crate::trace::EvaluationTrace;
use crate::variables::VariableStore;
use regex::Regex;
use tracing::warn;

/// Evaluates comparison groups against one session's variables.
pub(super) struct ConditionEngine<'a> {
    store: &'a VariableStore,
}

impl<'a> ConditionEngine<'a> {
    pub(super) fn new(store: &'a VariableStore) -> Self {
        Self { store }
    }

    /// Evaluates the group left to right, short-circuiting like `&&` / `||`.
    pub(super) fn evaluate_group(&self, group: &ConditionGroup) -> EvaluationTrace {
        let mut children = Vec::with_capacity(group.comparisons.len());
        let mut decided = None;

        for comparison in &group.comparisons {
            if decided.is_some() {
                children.push(EvaluationTrace::NotEvaluated);
                continue;
            }
            let trace = self.evaluate_comparison(comparison);
            let outcome = trace.outcome();
            children.push(trace);
            match (group.logical_operator, outcome) {
                (LogicalOperator::And, false) => decided = Some(false),
                (LogicalOperator::Or, true) => decided = Some(true),
                _ => {}
            }
        }

        let outcome = decided.unwrap_or(match group.logical_operator {
            LogicalOperator::And => true,
            LogicalOperator::Or => false,
        });

        EvaluationTrace::Group {
            group_id: group.id.clone(),
            operator: group.logical_operator,
            children,
            outcome,
        }
    }

    fn evaluate_comparison(&self, comparison: &ConditionComparison) -> EvaluationTrace {
        let actual = self.store.get(&comparison.variable_name);
        let left = actual.unwrap_or("");
        let is_pattern = matches!(
            comparison.operator,
            ComparisonOperator::MatchesRegex | ComparisonOperator::NotMatchesRegex
        );
        let expected = comparison.value.as_deref().map(|value| {
            if is_pattern {
                value.to_string()
            } else {
                text::render_plain(value, self.store)
            }
        });
        let right = expected.as_deref().unwrap_or("");

        let mut note = None;
        let outcome = match comparison.operator {
            ComparisonOperator::Equals => left == right,
            ComparisonOperator::NotEquals => left != right,
            ComparisonOperator::Contains => left.contains(right),
            ComparisonOperator::NotContains => !left.contains(right),
            ComparisonOperator::StartsWith => left.starts_with(right),
            ComparisonOperator::EndsWith => left.ends_with(right),
            ComparisonOperator::GreaterThan => compare_numbers(left, right, |a, b| a > b),
            ComparisonOperator::LessThan => compare_numbers(left, right, |a, b| a < b),
            ComparisonOperator::IsSet => !left.is_empty(),
            ComparisonOperator::IsEmpty => left.is_empty(),
            ComparisonOperator::MatchesRegex | ComparisonOperator::NotMatchesRegex => {
                match Regex::new(right) {
                    Ok(pattern) => {
                        let found = pattern.is_match(left);
                        if comparison.operator == ComparisonOperator::MatchesRegex {
                            found
                        } else {
                            !found
                        }
                    }
                    Err(e) => {
                        warn!(
                            variable = %comparison.variable_name,
                            pattern = %right,
                            error = %e,
                            "Malformed pattern in condition, comparison evaluates to false"
                        );
                        note = Some(format!("invalid pattern: {}", e));
                        false
                    }
                }
            }
        };

        EvaluationTrace::Comparison {
            variable: comparison.variable_name.clone(),
            actual: actual.map(str::to_string),
            operator: comparison.operator,
            expected: if comparison.operator.takes_value() {
                expected
            } else {
                None
            },
            outcome,
            note,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Non-numeric operands make the comparison false.
fn compare_numbers(left: &str, right: &str, op: fn(f64, f64) -> bool) -> bool {
    match (parse_number(left), parse_number(right)) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}
