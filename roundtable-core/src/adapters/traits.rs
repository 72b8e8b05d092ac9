use crate::models::EngineKind;

use super::types::{AgentEventStream, AgentTask};

/// A coding agent engine that can run one member turn.
///
/// Implementations must not start work before the returned stream is
/// polled, and every failure mode, including a missing binary or a dead
/// child process, must surface as an [`super::AgentEvent::Error`] item
/// on the stream rather than a panic or a pre-stream return.
pub trait EngineAdapter: Send + Sync {
    fn engine(&self) -> EngineKind;

    fn run(&self, task: AgentTask) -> AgentEventStream;
}
