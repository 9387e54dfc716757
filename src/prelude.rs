//! Prelude module for convenient imports
//!
//! Re-exports the types needed to compile a workspace and run sessions
//! against it.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/workspace.json")?;
//! let executor = Executor::new(Compiler::from_json(&json)?.compile()?);
//!
//! let (mut session, _events) = executor.start_session("s-1");
//! let events = executor.handle(&mut session, InboundEvent::selection("s-1", ["yes"]))?;
//! println!("{} events", events.len());
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{CompiledGraph, Compiler};
pub use crate::workspace::{IntoWorkspace, WorkspaceDefinition};

// Execution
pub use crate::executor::{
    Executor, ExecutorConfig, InboundEvent, IoCollaborator, IoOutcome, OutboundEvent,
    OutboundKind, Session, SessionDriver, SessionSnapshot, SessionStatus, TerminationReason,
};

// Variables and text
pub use crate::variables::VariableStore;

// Error types
pub use crate::error::{CompileError, ExecutionError, SnapshotError, ValidationErrors, Violation};

// Trace formatting
pub use crate::trace::{EvaluationTrace, TraceFormatter};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
