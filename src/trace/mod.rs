mod evaluation;
mod formatter;

pub use evaluation::EvaluationTrace;
pub use formatter::TraceFormatter;
