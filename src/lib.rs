//! # Chatflow - Conversational Flow Compilation and Execution Engine
//!
//! **Chatflow** runs chatbot conversations designed as node graphs. A workspace
//! groups ordered nodes (message bubbles, inputs, buttons, variable
//! assignments, conditions, external calls) into containers connected by
//! edges. The engine validates and compiles a workspace once, then drives any
//! number of independent sessions through it, one inbound event at a time.
//!
//! ## Core Workflow
//!
//! 1.  **Load a workspace**: parse the editor's JSON export into a
//!     `WorkspaceDefinition`, or implement `IntoWorkspace` for your own editor model.
//! 2.  **Compile**: `Compiler::compile` checks every structural invariant and reports
//!     all violations at once. The result is an immutable `CompiledGraph`.
//! 3.  **Execute**: an `Executor` starts sessions and feeds them replies, button
//!     selections and I/O results. Each call returns the outbound events the
//!     session produced before it suspended again or terminated.
//! 4.  **Persist**: `Session::snapshot` captures everything needed to resume later,
//!     as JSON or compact bincode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("path/to/workspace.json")?;
//!     let graph = Compiler::from_json(&json)?.compile()?;
//!     let executor = Executor::new(graph);
//!
//!     let (mut session, events) = executor.start_session("session-1");
//!     for event in &events {
//!         if let Some(text) = event.rendered_text() {
//!             println!("bot: {}", text);
//!         }
//!     }
//!
//!     let events = executor.handle(&mut session, InboundEvent::reply("session-1", "Bob"))?;
//!     for event in &events {
//!         if let Some(reason) = event.termination() {
//!             println!("conversation ended: {:?}", reason);
//!         }
//!     }
//!
//!     let snapshot = session.snapshot().to_json()?;
//!     println!("{}", snapshot);
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod condition;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod text;
pub mod trace;
pub mod variables;
pub mod workspace;
