use crate::condition::{ComparisonOperator, LogicalOperator};

/// A record of how a condition group was evaluated, including the values seen.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationTrace {
    Group {
        group_id: String,
        operator: LogicalOperator,
        children: Vec<EvaluationTrace>,
        outcome: bool,
    },
    Comparison {
        variable: String,
        /// The stored value, `None` when the variable was never assigned.
        actual: Option<String>,
        operator: ComparisonOperator,
        /// The rendered comparison operand, for operators that take one.
        expected: Option<String>,
        outcome: bool,
        note: Option<String>,
    },
    /// A comparison skipped by short-circuiting.
    NotEvaluated,
}

impl EvaluationTrace {
    pub fn outcome(&self) -> bool {
        match self {
            EvaluationTrace::Group { outcome, .. } => *outcome,
            EvaluationTrace::Comparison { outcome, .. } => *outcome,
            EvaluationTrace::NotEvaluated => false,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        !matches!(self, EvaluationTrace::NotEvaluated)
    }
}
