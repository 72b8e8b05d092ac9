use futures::stream;

use crate::models::EngineKind;

use super::traits::EngineAdapter;
use super::types::{AgentEvent, AgentEventStream, AgentTask};

/// Placeholder adapter until Gemini support lands.
pub struct GeminiAdapter;

impl EngineAdapter for GeminiAdapter {
    fn engine(&self) -> EngineKind {
        EngineKind::Gemini
    }

    fn run(&self, _task: AgentTask) -> AgentEventStream {
        Box::pin(stream::iter([AgentEvent::Error {
            message: "Gemini engine is not implemented yet. Please use Claude.".to_string(),
        }]))
    }
}
