use std::pin::Pin;

use futures::Stream;

/// One member turn handed to an engine adapter.
///
/// Everything the engine needs is resolved up front by the caller, so
/// adapters never touch the store or the environment themselves.
#[derive(Debug, Clone)]
pub struct AgentTask {
    /// The user's message for this round, passed through verbatim.
    pub prompt: String,
    /// Repository directory the engine works in.
    pub repo_path: String,
    /// Prepared system prompt: persona, context block, conversation history.
    pub system_prompt: String,
    /// Credential for the engine, already resolved per member.
    pub api_key: String,
}

/// Events produced while an engine works on a task.
///
/// A well-formed run is zero or more `Chunk`s followed by exactly one
/// terminal event, after which the stream ends.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Incremental visible output.
    Chunk { text: String },
    /// Successful completion with the full accumulated answer.
    Done { text: String },
    /// Failed completion with a printable reason.
    Error { message: String },
}

impl AgentEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Done { .. } | AgentEvent::Error { .. })
    }
}

/// Lazy, single-pass event stream returned by [`super::EngineAdapter::run`].
pub type AgentEventStream = Pin<Box<dyn Stream<Item = AgentEvent> + Send>>;
