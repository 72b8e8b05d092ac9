use futures::stream;

use crate::models::EngineKind;

use super::traits::EngineAdapter;
use super::types::{AgentEvent, AgentEventStream, AgentTask};

/// Placeholder adapter until Codex support lands.
pub struct CodexAdapter;

impl EngineAdapter for CodexAdapter {
    fn engine(&self) -> EngineKind {
        EngineKind::Codex
    }

    fn run(&self, _task: AgentTask) -> AgentEventStream {
        Box::pin(stream::iter([AgentEvent::Error {
            message: "Codex engine is not implemented yet. Please use Claude.".to_string(),
        }]))
    }
}
