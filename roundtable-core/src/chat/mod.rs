pub mod context;
pub mod events;
pub mod mentions;
pub mod orchestrator;
pub mod prompt;
pub mod runner;

pub use context::{combine_context_sources, context_block_for, MAX_CONTEXT_CHARS};
pub use events::{RoundEvent, RoundEventStream};
pub use mentions::{mention_tokens, resolve_targets};
pub use orchestrator::{OrchestratorConfig, TurnOrchestrator};
pub use prompt::{
    build_system_prompt, format_conversation_history, history_with_round_responses, PeerAnswer,
};
pub use runner::{EngineTurnRunner, TurnRequest, TurnRunner};
