use super::{
    Executor, InboundEvent, IoOutcome, IoRequest, OutboundEvent, Session, TerminationReason,
};
use crate::error::ExecutionError;
use tracing::{debug, warn};

/// Performs the side effects of webhook, http-request and script nodes.
///
/// `Ok` carries the value to store in the node's `saveVariable`; `Err`
/// carries a failure reason.
pub trait IoCollaborator: Send + Sync {
    fn invoke(&self, request: &IoRequest) -> Result<String, String>;
}

impl<F> IoCollaborator for F
where
    F: Fn(&IoRequest) -> Result<String, String> + Send + Sync,
{
    fn invoke(&self, request: &IoRequest) -> Result<String, String> {
        self(request)
    }
}

/// Runs sessions with I/O requests answered inline by a collaborator, so
/// callers only ever see sessions suspended on user input or terminated.
///
/// Each request is invoked once; failures are fed back as-is.
pub struct SessionDriver<'a> {
    executor: &'a Executor,
    collaborator: &'a dyn IoCollaborator,
}

impl<'a> SessionDriver<'a> {
    pub fn new(executor: &'a Executor, collaborator: &'a dyn IoCollaborator) -> Self {
        Self {
            executor,
            collaborator,
        }
    }

    pub fn start(&self, session_id: &str) -> Result<(Session, Vec<OutboundEvent>), ExecutionError> {
        let (mut session, events) = self.executor.start_session(session_id);
        let events = self.settle(&mut session, events)?;
        Ok((session, events))
    }

    pub fn handle(
        &self,
        session: &mut Session,
        event: InboundEvent,
    ) -> Result<Vec<OutboundEvent>, ExecutionError> {
        let events = self.executor.handle(session, event)?;
        self.settle(session, events)
    }

    /// Re-emits a restored session's pending request, answering it if it is I/O.
    pub fn resume(&self, session: &mut Session) -> Result<Vec<OutboundEvent>, ExecutionError> {
        let events = self.executor.resume(session)?;
        self.settle(session, events)
    }

    /// Answers I/O requests until the session waits on the user or ends.
    ///
    /// Flows that loop through I/O nodes are bounded by the executor's step
    /// limit, counted in collaborator calls.
    fn settle(
        &self,
        session: &mut Session,
        mut events: Vec<OutboundEvent>,
    ) -> Result<Vec<OutboundEvent>, ExecutionError> {
        let limit = self.executor.config().max_steps_per_event;
        let mut calls = 0;
        let mut pending = events.last().and_then(OutboundEvent::io_request).cloned();

        while let Some(request) = pending.take() {
            if calls >= limit {
                warn!(session = %session.id(), limit, "I/O round trips exceeded the step limit");
                let reason = TerminationReason::StepLimitExceeded { limit };
                events.extend(self.executor.force_terminate(session, reason));
                break;
            }
            calls += 1;

            let outcome = match self.collaborator.invoke(&request) {
                Ok(value) => IoOutcome::Success(value),
                Err(reason) => IoOutcome::Failure(reason),
            };
            debug!(session = %session.id(), node = %request.node_id, ?outcome, "I/O call finished");

            let event = InboundEvent::io_result(session.id(), outcome);
            let batch = self.executor.handle(session, event)?;
            pending = batch.last().and_then(OutboundEvent::io_request).cloned();
            events.extend(batch);
        }
        Ok(events)
    }
}
