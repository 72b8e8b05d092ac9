pub mod claude;
pub mod codex;
pub mod factory;
pub mod gemini;
mod traits;
pub mod types;

pub use claude::{ClaudeAdapter, ClaudeConfig, DEFAULT_CLAUDE_MODEL};
pub use codex::CodexAdapter;
pub use factory::{create_adapter, create_adapter_with_config, AdapterConfig};
pub use gemini::GeminiAdapter;
pub use traits::EngineAdapter;
pub use types::{AgentEvent, AgentEventStream, AgentTask};
