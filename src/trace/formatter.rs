use super::EvaluationTrace;
use itertools::Itertools;

/// Formats evaluation traces into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format an evaluation trace into a human-readable explanation.
    pub fn format_trace(trace: &EvaluationTrace) -> String {
        Self::format_recursive(trace, false)
    }

    /// Formats several group traces, one per line, prefixed by their group id.
    pub fn format_groups(traces: &[EvaluationTrace]) -> String {
        traces
            .iter()
            .map(|trace| match trace {
                EvaluationTrace::Group {
                    group_id, outcome, ..
                } => format!("[{}] {} => {}", group_id, Self::format_trace(trace), outcome),
                other => Self::format_trace(other),
            })
            .join("\n")
    }

    /// Nested groups are wrapped in parentheses; the outermost one is not.
    fn format_recursive(trace: &EvaluationTrace, nested: bool) -> String {
        match trace {
            EvaluationTrace::Group {
                operator, children, ..
            } => {
                // Only the comparisons that decided the outcome are shown.
                let parts: Vec<String> = children
                    .iter()
                    .filter(|child| child.is_evaluated())
                    .map(|child| Self::format_recursive(child, true))
                    .collect();
                if parts.is_empty() {
                    return format!("<empty {}>", operator.symbol());
                }
                let joined = parts.join(&format!(" {} ", operator.symbol()));
                if nested && parts.len() > 1 {
                    format!("({})", joined)
                } else {
                    joined
                }
            }
            EvaluationTrace::Comparison {
                variable,
                actual,
                operator,
                expected,
                note,
                ..
            } => {
                let mut result =
                    format!("{} ({}) {}", variable, Self::format_value(actual), operator);
                if let Some(expected) = expected {
                    result.push_str(&format!(" {:?}", expected));
                }
                if let Some(note) = note {
                    result.push_str(&format!(" [{}]", note));
                }
                result
            }
            EvaluationTrace::NotEvaluated => String::new(),
        }
    }

    fn format_value(value: &Option<String>) -> String {
        match value {
            Some(v) => format!("was {:?}", v),
            None => "unset".to_string(),
        }
    }
}
