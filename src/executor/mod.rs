//! Drives sessions through a compiled graph, one inbound event at a time.
//!
//! The executor itself is immutable and holds nothing but the shared graph
//! and its configuration. All per-conversation state lives in [`Session`],
//! which callers own and hand back in on every call.

use crate::compiler::CompiledGraph;
use crate::condition::select_group;
use crate::error::ExecutionError;
use crate::text::{Scope, Template, render_plain};
use crate::trace::TraceFormatter;
use crate::variables::VariableStore;
use crate::workspace::{ButtonItem, ButtonsConfig, InputConfig, InputKind, Node, NodeKind};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

mod driver;
mod events;
mod input;
mod session;

pub use driver::{IoCollaborator, SessionDriver};
pub use events::*;
pub use input::DEFAULT_RETRY_MESSAGE;
pub use session::{Position, Session, SessionSnapshot, SessionStatus, TerminationReason};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutorConfig {
    /// Upper bound on node dispatches while processing a single event.
    pub max_steps_per_event: usize,
    /// Passed through to I/O collaborators with every request.
    pub io_timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_steps_per_event: 1000,
            io_timeout_ms: 10_000,
        }
    }
}

impl ExecutorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

pub struct ExecutorBuilder {
    graph: Arc<CompiledGraph>,
    config: ExecutorConfig,
}

impl ExecutorBuilder {
    pub fn new(graph: impl Into<Arc<CompiledGraph>>) -> Self {
        Self {
            graph: graph.into(),
            config: ExecutorConfig::default(),
        }
    }

    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_steps_per_event(mut self, limit: usize) -> Self {
        self.config.max_steps_per_event = limit;
        self
    }

    pub fn io_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.io_timeout_ms = timeout_ms;
        self
    }

    pub fn build(self) -> Executor {
        Executor {
            graph: self.graph,
            config: self.config,
        }
    }
}

/// A node address inside the graph: container index and node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    container: usize,
    index: usize,
}

impl Cursor {
    fn entry(container: usize) -> Self {
        Self {
            container,
            index: 0,
        }
    }
}

/// What happens after a node has been dispatched.
#[derive(Debug)]
enum Step {
    Continue(Cursor),
    Suspend,
    Terminate(TerminationReason),
}

/// Runs sessions against one compiled graph. Cheap to clone and safe to
/// share between threads.
#[derive(Debug, Clone)]
pub struct Executor {
    graph: Arc<CompiledGraph>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(graph: impl Into<Arc<CompiledGraph>>) -> Self {
        ExecutorBuilder::new(graph).build()
    }

    pub fn builder(graph: impl Into<Arc<CompiledGraph>>) -> ExecutorBuilder {
        ExecutorBuilder::new(graph)
    }

    pub fn graph(&self) -> &CompiledGraph {
        &self.graph
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Creates a session at the start node and runs it until it first
    /// suspends or terminates.
    pub fn start_session(&self, session_id: &str) -> (Session, Vec<OutboundEvent>) {
        self.start_session_with_variables(session_id, std::iter::empty::<(String, String)>())
    }

    /// Like [`Executor::start_session`], with caller-supplied values applied
    /// over the start node's initial variables.
    pub fn start_session_with_variables<K, V>(
        &self,
        session_id: &str,
        variables: impl IntoIterator<Item = (K, V)>,
    ) -> (Session, Vec<OutboundEvent>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut store = VariableStore::new();
        if let Some(config) = self.graph.start_config() {
            for variable in &config.initial_variables {
                store.set(&variable.name, variable.default_value.clone());
            }
        }
        store.sync_from_graph(&self.graph);
        for (name, value) in variables {
            store.set(name.as_ref(), value);
        }

        let start = Cursor::entry(self.graph.start_container());
        let mut session = Session {
            id: session_id.to_string(),
            workspace_version: self.graph.version().to_string(),
            store,
            position: self.position_of(start),
            status: SessionStatus::Running,
        };
        info!(
            session = %session.id,
            workspace = %self.graph.name(),
            version = %session.workspace_version,
            "Session started"
        );

        let mut out = Vec::new();
        self.run(&mut session, start, &mut out);
        (session, out)
    }

    /// Feeds one inbound event to a suspended session.
    ///
    /// Usage errors leave the session untouched. A late I/O result for a
    /// terminated session is discarded and yields no events.
    pub fn handle(
        &self,
        session: &mut Session,
        event: InboundEvent,
    ) -> Result<Vec<OutboundEvent>, ExecutionError> {
        if event.session_id != session.id {
            return Err(ExecutionError::SessionMismatch {
                expected: session.id.clone(),
                found: event.session_id,
            });
        }

        if session.status.is_terminated() {
            if let InboundKind::WebhookPayload(_) = event.kind {
                debug!(session = %session.id, "Discarding I/O result for terminated session");
                return Ok(Vec::new());
            }
            return Err(ExecutionError::SessionTerminated(session.id.clone()));
        }
        if session.status != SessionStatus::AwaitingInput {
            return Err(ExecutionError::NotAwaitingInput(session.id.clone()));
        }

        let cursor = self.resolve(&session.position)?;
        let node = self.node_at(cursor).ok_or_else(|| self.invalid_position(&session.position))?;
        let mut out = Vec::new();

        let step = match (&node.kind, event.kind) {
            (NodeKind::Input { input, config }, InboundKind::Reply(reply)) => {
                match input::validate_reply(*input, config, &reply) {
                    Some(value) => {
                        if let Some(variable) = &config.save_variable {
                            session.store.set(variable, value);
                        }
                        self.advance(cursor, node)
                    }
                    None => {
                        debug!(session = %session.id, node = %node.id, "Rejected reply");
                        let prompt = self.input_prompt(session, node, *input, config, true);
                        out.push(prompt);
                        return Ok(out);
                    }
                }
            }
            (NodeKind::Buttons(config), InboundKind::Selection(ids)) => {
                let picked = Self::selected_buttons(node, config, &ids)?;
                self.apply_selection(session, cursor, node, config, &picked)
            }
            (NodeKind::Buttons(config), InboundKind::Reply(reply)) => {
                match config.button_by_label(&reply) {
                    Some(button) => self.apply_selection(session, cursor, node, config, &[button]),
                    None => {
                        debug!(session = %session.id, node = %node.id, "Reply matched no button label");
                        let prompt = self.button_prompt(session, node, config, true);
                        out.push(prompt);
                        return Ok(out);
                    }
                }
            }
            (kind, InboundKind::WebhookPayload(outcome)) if kind.io_kind().is_some() => {
                self.complete_io(session, cursor, node, outcome)
            }
            (kind, other) => {
                return Err(ExecutionError::UnexpectedEvent {
                    node_id: node.id.clone(),
                    expected: Self::expected_event(kind),
                    found: other.name(),
                });
            }
        };

        session.status = SessionStatus::Running;
        self.follow(session, step, &mut out);
        Ok(out)
    }

    /// Continues a restored session. A running session executes from its
    /// position; a suspended one re-emits its pending prompt or I/O request.
    pub fn resume(&self, session: &mut Session) -> Result<Vec<OutboundEvent>, ExecutionError> {
        let mut out = Vec::new();
        match session.status {
            SessionStatus::Terminated { .. } => {}
            SessionStatus::Running => {
                let cursor = self.resolve(&session.position)?;
                self.run(session, cursor, &mut out);
            }
            SessionStatus::AwaitingInput => {
                let cursor = self.resolve(&session.position)?;
                let node =
                    self.node_at(cursor).ok_or_else(|| self.invalid_position(&session.position))?;
                out.extend(self.pending_request(session, node));
            }
        }
        Ok(out)
    }

    /// Terminates the session as cancelled. Cancelling a terminated session
    /// is a no-op.
    pub fn cancel(&self, session: &mut Session) -> Vec<OutboundEvent> {
        self.force_terminate(session, TerminationReason::Cancelled)
    }

    /// Rebuilds a session from a snapshot taken against this graph.
    pub fn restore(&self, snapshot: SessionSnapshot) -> Result<Session, ExecutionError> {
        if snapshot.workspace_version != self.graph.version() {
            return Err(ExecutionError::WorkspaceVersionMismatch {
                expected: self.graph.version().to_string(),
                found: snapshot.workspace_version,
            });
        }

        let cursor = self.resolve(&snapshot.position)?;
        if snapshot.status == SessionStatus::AwaitingInput {
            let suspending = self.node_at(cursor).is_some_and(|node| node.kind.is_suspending());
            if !suspending {
                return Err(ExecutionError::InvalidPosition {
                    container_id: snapshot.position.container_id,
                    node_index: snapshot.position.node_index,
                    message: "node does not wait for input".to_string(),
                });
            }
        }

        debug!(session = %snapshot.session_id, "Session restored");
        Ok(Session {
            id: snapshot.session_id,
            workspace_version: snapshot.workspace_version,
            store: VariableStore::from_snapshot(snapshot.store_snapshot),
            position: snapshot.position,
            status: snapshot.status,
        })
    }

    /// Forces termination with `reason` unless the session already ended.
    pub(crate) fn force_terminate(
        &self,
        session: &mut Session,
        reason: TerminationReason,
    ) -> Vec<OutboundEvent> {
        let mut out = Vec::new();
        if !session.status.is_terminated() {
            self.terminate(session, reason, &mut out);
        }
        out
    }

    fn run(&self, session: &mut Session, start: Cursor, out: &mut Vec<OutboundEvent>) {
        let limit = self.config.max_steps_per_event;
        let mut cursor = start;
        let mut steps = 0;
        session.status = SessionStatus::Running;

        loop {
            if steps >= limit {
                warn!(session = %session.id, limit, "Step limit exceeded");
                self.terminate(session, TerminationReason::StepLimitExceeded { limit }, out);
                return;
            }
            steps += 1;

            session.position = self.position_of(cursor);
            let step = match self.node_at(cursor) {
                Some(node) => self.dispatch(session, cursor, node, out),
                None => {
                    warn!(session = %session.id, ?cursor, "Cursor left the graph");
                    Step::Terminate(TerminationReason::Completed)
                }
            };

            match step {
                Step::Continue(next) => cursor = next,
                Step::Suspend => {
                    debug!(
                        session = %session.id,
                        container = %session.position.container_id,
                        index = session.position.node_index,
                        "Session awaiting input"
                    );
                    session.status = SessionStatus::AwaitingInput;
                    return;
                }
                Step::Terminate(reason) => {
                    self.terminate(session, reason, out);
                    return;
                }
            }
        }
    }

    fn follow(&self, session: &mut Session, step: Step, out: &mut Vec<OutboundEvent>) {
        match step {
            Step::Continue(next) => self.run(session, next, out),
            Step::Suspend => session.status = SessionStatus::AwaitingInput,
            Step::Terminate(reason) => self.terminate(session, reason, out),
        }
    }

    fn dispatch(
        &self,
        session: &mut Session,
        cursor: Cursor,
        node: &Node,
        out: &mut Vec<OutboundEvent>,
    ) -> Step {
        debug!(session = %session.id, node = %node.id, node_type = %node.node_type(), "Dispatching node");

        match &node.kind {
            NodeKind::Start(_) => self.advance(cursor, node),
            NodeKind::TextBubble(config) => {
                let template = Template::parse(&config.content);
                let scope = Scope::new(&session.store);
                let content = BubbleContent::Text {
                    text: template.render(&scope),
                    segments: template.render_rich(&scope),
                };
                out.push(self.render_event(session, node, content));
                self.advance(cursor, node)
            }
            NodeKind::NumberBubble(config) => {
                let content = BubbleContent::Number {
                    text: render_plain(&config.content, &session.store),
                };
                out.push(self.render_event(session, node, content));
                self.advance(cursor, node)
            }
            NodeKind::MediaBubble { media, config } => {
                let content = BubbleContent::Media {
                    media: *media,
                    url: render_plain(&config.url, &session.store),
                    caption: config
                        .caption
                        .as_deref()
                        .map(|caption| render_plain(caption, &session.store)),
                };
                out.push(self.render_event(session, node, content));
                self.advance(cursor, node)
            }
            NodeKind::SetVariable(config) => {
                let value = render_plain(&config.value, &session.store);
                debug!(session = %session.id, variable = %config.variable_name, "Setting variable");
                session.store.set(&config.variable_name, value);
                self.advance(cursor, node)
            }
            NodeKind::Condition(config) => {
                let (group, traces) = select_group(&config.groups, &session.store);
                if let Some(group) = group {
                    debug!(session = %session.id, node = %node.id, group = %group.id, "Condition group matched");
                    let handle = Some(group.id.as_str());
                    if let Some(target) = self.graph.edge_target(cursor.container, handle) {
                        return Step::Continue(Cursor::entry(target));
                    }
                    return self.advance(cursor, node);
                }

                match self.advance(cursor, node) {
                    Step::Terminate(TerminationReason::Completed) => {
                        let detail = if traces.is_empty() {
                            "no condition groups".to_string()
                        } else {
                            TraceFormatter::format_groups(&traces).lines().join("; ")
                        };
                        Step::Terminate(TerminationReason::DeadEnd {
                            node_id: node.id.clone(),
                            detail,
                        })
                    }
                    step => step,
                }
            }
            NodeKind::Input { .. } | NodeKind::Buttons(_) => {
                out.extend(self.pending_request(session, node));
                Step::Suspend
            }
            NodeKind::Webhook(_) | NodeKind::HttpRequest(_) | NodeKind::Script(_) => {
                out.extend(self.pending_request(session, node));
                Step::Suspend
            }
        }
    }

    /// Normal completion: the node's own exit edge, then the next node, then
    /// the container's unconditional edge.
    fn advance(&self, cursor: Cursor, node: &Node) -> Step {
        if let Some(target) = self.graph.edge_target(cursor.container, Some(node.id.as_str())) {
            return Step::Continue(Cursor::entry(target));
        }
        let length = self
            .graph
            .container(cursor.container)
            .map_or(0, |container| container.nodes.len());
        if cursor.index + 1 < length {
            return Step::Continue(Cursor {
                container: cursor.container,
                index: cursor.index + 1,
            });
        }
        match self.graph.edge_target(cursor.container, None) {
            Some(target) => Step::Continue(Cursor::entry(target)),
            None => Step::Terminate(TerminationReason::Completed),
        }
    }

    fn apply_selection(
        &self,
        session: &mut Session,
        cursor: Cursor,
        node: &Node,
        config: &ButtonsConfig,
        picked: &[&ButtonItem],
    ) -> Step {
        if let Some(variable) = &config.save_variable {
            let joined = picked.iter().map(|button| button.value()).join(", ");
            session.store.set(variable, joined);
        }
        for button in picked {
            if let Some(variable) = &button.save_variable {
                session.store.set(variable, button.value());
            }
        }

        if let [button] = picked {
            let handle = Some(button.id.as_str());
            if let Some(target) = self.graph.edge_target(cursor.container, handle) {
                return Step::Continue(Cursor::entry(target));
            }
        }
        self.advance(cursor, node)
    }

    fn selected_buttons<'n>(
        node: &Node,
        config: &'n ButtonsConfig,
        ids: &[String],
    ) -> Result<Vec<&'n ButtonItem>, ExecutionError> {
        let ids: Vec<&String> = ids.iter().unique().collect();
        if ids.is_empty() {
            return Err(ExecutionError::InvalidSelectionCount {
                node_id: node.id.clone(),
                count: 0,
                expected: "at least one is required",
            });
        }
        if ids.len() > 1 && !config.is_multiple_choice {
            return Err(ExecutionError::InvalidSelectionCount {
                node_id: node.id.clone(),
                count: ids.len(),
                expected: "exactly one is allowed",
            });
        }
        ids.into_iter()
            .map(|id| {
                config.button(id).ok_or_else(|| ExecutionError::UnknownButton {
                    node_id: node.id.clone(),
                    button_id: id.clone(),
                })
            })
            .collect()
    }

    fn complete_io(
        &self,
        session: &mut Session,
        cursor: Cursor,
        node: &Node,
        outcome: IoOutcome,
    ) -> Step {
        match outcome {
            IoOutcome::Success(value) => {
                let variable = match &node.kind {
                    NodeKind::Webhook(config) => config.save_variable.as_deref(),
                    NodeKind::HttpRequest(config) => config.save_variable.as_deref(),
                    NodeKind::Script(config) => config.save_variable.as_deref(),
                    _ => None,
                };
                if let Some(variable) = variable {
                    session.store.set(variable, value);
                }
                self.advance(cursor, node)
            }
            IoOutcome::Failure(error) => {
                warn!(session = %session.id, node = %node.id, %error, "I/O call failed");
                let handle = node.failure_handle();
                match self.graph.edge_target(cursor.container, Some(handle.as_str())) {
                    Some(target) => Step::Continue(Cursor::entry(target)),
                    None => Step::Terminate(TerminationReason::IoFailure {
                        node_id: node.id.clone(),
                        error,
                    }),
                }
            }
        }
    }

    fn terminate(
        &self,
        session: &mut Session,
        reason: TerminationReason,
        out: &mut Vec<OutboundEvent>,
    ) {
        info!(session = %session.id, ?reason, "Session terminated");
        session.status = SessionStatus::Terminated {
            reason: reason.clone(),
        };
        out.push(OutboundEvent::new(&session.id, OutboundKind::Terminated(reason)));
    }

    /// The event a suspending node emits while waiting.
    fn pending_request(&self, session: &Session, node: &Node) -> Option<OutboundEvent> {
        let store = &session.store;
        let call = match &node.kind {
            NodeKind::Input { input, config } => {
                return Some(self.input_prompt(session, node, *input, config, false));
            }
            NodeKind::Buttons(config) => {
                return Some(self.button_prompt(session, node, config, false));
            }
            NodeKind::Webhook(config) => IoCall::Webhook {
                url: config.url.as_deref().map(|url| render_plain(url, store)),
            },
            NodeKind::HttpRequest(config) => IoCall::HttpRequest {
                method: config.method,
                url: render_plain(&config.url, store),
                headers: config
                    .headers
                    .iter()
                    .map(|(name, value)| (name.clone(), render_plain(value, store)))
                    .collect(),
                body: config.body.as_deref().map(|body| render_plain(body, store)),
            },
            NodeKind::Script(config) => IoCall::Script {
                code: config.code.clone(),
            },
            _ => return None,
        };
        let request = IoRequest {
            node_id: node.id.clone(),
            call,
            variables: store.snapshot(),
            timeout_ms: self.config.io_timeout_ms,
        };
        Some(OutboundEvent::new(&session.id, OutboundKind::IoRequest(request)))
    }

    fn input_prompt(
        &self,
        session: &Session,
        node: &Node,
        input: InputKind,
        config: &InputConfig,
        retry: bool,
    ) -> OutboundEvent {
        let store = &session.store;
        let payload = PromptPayload {
            node_id: node.id.clone(),
            input,
            variable: config.save_variable.clone(),
            placeholder: config
                .placeholder
                .as_deref()
                .map(|placeholder| render_plain(placeholder, store)),
            retry_message: retry
                .then(|| Self::retry_message(config.retry_message.as_deref(), store)),
        };
        OutboundEvent::new(&session.id, OutboundKind::Prompt(payload))
    }

    fn button_prompt(
        &self,
        session: &Session,
        node: &Node,
        config: &ButtonsConfig,
        retry: bool,
    ) -> OutboundEvent {
        let store = &session.store;
        let payload = ButtonPromptPayload {
            node_id: node.id.clone(),
            buttons: config
                .buttons
                .iter()
                .map(|button| ButtonChoice {
                    id: button.id.clone(),
                    label: render_plain(&button.label, store),
                })
                .collect(),
            multiple_choice: config.is_multiple_choice,
            retry_message: retry
                .then(|| Self::retry_message(config.retry_message.as_deref(), store)),
        };
        OutboundEvent::new(&session.id, OutboundKind::ButtonPrompt(payload))
    }

    fn retry_message(configured: Option<&str>, store: &VariableStore) -> String {
        match configured {
            Some(message) if !message.trim().is_empty() => render_plain(message, store),
            _ => DEFAULT_RETRY_MESSAGE.to_string(),
        }
    }

    fn render_event(
        &self,
        session: &Session,
        node: &Node,
        content: BubbleContent,
    ) -> OutboundEvent {
        let payload = RenderPayload {
            node_id: node.id.clone(),
            content,
        };
        OutboundEvent::new(&session.id, OutboundKind::Render(payload))
    }

    fn expected_event(kind: &NodeKind) -> &'static str {
        match kind {
            NodeKind::Input { .. } => "reply",
            NodeKind::Buttons(_) => "selection",
            _ if kind.io_kind().is_some() => "webhookPayload",
            _ => "no",
        }
    }

    fn node_at(&self, cursor: Cursor) -> Option<&Node> {
        self.graph
            .container(cursor.container)
            .and_then(|container| container.nodes.get(cursor.index))
    }

    fn position_of(&self, cursor: Cursor) -> Position {
        let container_id = self
            .graph
            .container(cursor.container)
            .map(|container| container.id.as_str())
            .unwrap_or_default();
        Position::new(container_id, cursor.index)
    }

    fn resolve(&self, position: &Position) -> Result<Cursor, ExecutionError> {
        let Some(container) = self.graph.container_position(&position.container_id) else {
            return Err(ExecutionError::InvalidPosition {
                container_id: position.container_id.clone(),
                node_index: position.node_index,
                message: "unknown container".to_string(),
            });
        };
        let cursor = Cursor {
            container,
            index: position.node_index,
        };
        if self.node_at(cursor).is_none() {
            return Err(self.invalid_position(position));
        }
        Ok(cursor)
    }

    fn invalid_position(&self, position: &Position) -> ExecutionError {
        ExecutionError::InvalidPosition {
            container_id: position.container_id.clone(),
            node_index: position.node_index,
            message: "node index out of range".to_string(),
        }
    }
}
