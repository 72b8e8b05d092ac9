use std::sync::Arc;

use futures::stream;

use crate::adapters::{
    create_adapter_with_config, AdapterConfig, AgentEvent, AgentEventStream, AgentTask,
    ClaudeConfig, EngineAdapter,
};
use crate::models::{EngineKind, Member};

use super::prompt::build_system_prompt;

/// Everything one member turn needs, resolved by the orchestrator.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub member: Member,
    /// The user's message, verbatim.
    pub user_message: String,
    /// Rendered history, already extended with this round's earlier answers.
    pub history: String,
    /// Rendered context block, possibly empty.
    pub context_block: String,
}

/// Produces the event stream for a single member turn.
///
/// The orchestrator depends on this seam rather than on the adapter
/// factory so tests can script whole rounds without any engine.
pub trait TurnRunner: Send + Sync {
    fn run_turn(&self, request: TurnRequest) -> AgentEventStream;
}

/// Production runner: resolves the credential, assembles the system
/// prompt, and dispatches to the adapter for the member's engine.
pub struct EngineTurnRunner {
    claude_config: ClaudeConfig,
}

impl EngineTurnRunner {
    pub fn new(claude_config: ClaudeConfig) -> Self {
        Self { claude_config }
    }

    fn adapter_for(&self, engine: EngineKind) -> Arc<dyn EngineAdapter> {
        let config = match engine {
            EngineKind::Claude => AdapterConfig::Claude(self.claude_config.clone()),
            EngineKind::Codex => AdapterConfig::Codex,
            EngineKind::Gemini => AdapterConfig::Gemini,
        };
        create_adapter_with_config(config)
    }
}

impl Default for EngineTurnRunner {
    fn default() -> Self {
        Self::new(ClaudeConfig::default())
    }
}

impl TurnRunner for EngineTurnRunner {
    fn run_turn(&self, request: TurnRequest) -> AgentEventStream {
        // Per-member key first, then the shared environment key. Empty
        // strings count as unset on both levels.
        let api_key = request
            .member
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                std::env::var("ANTHROPIC_API_KEY")
                    .ok()
                    .filter(|key| !key.is_empty())
            });

        let api_key = match api_key {
            Some(key) => key,
            None => {
                let message = format!(
                    "No API key configured for {}. Set one per-agent or in .env.",
                    request.member.name
                );
                return Box::pin(stream::iter([AgentEvent::Error { message }]));
            }
        };

        let system_prompt =
            build_system_prompt(&request.member, &request.context_block, &request.history);

        let task = AgentTask {
            prompt: request.user_message,
            repo_path: request.member.repo_path.clone(),
            system_prompt,
            api_key,
        };

        self.adapter_for(request.member.engine).run(task)
    }
}
