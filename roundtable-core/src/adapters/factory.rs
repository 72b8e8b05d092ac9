use std::sync::Arc;

use crate::models::EngineKind;

use super::claude::{ClaudeAdapter, ClaudeConfig};
use super::codex::CodexAdapter;
use super::gemini::GeminiAdapter;
use super::traits::EngineAdapter;

/// Per-engine adapter settings.
#[derive(Debug, Clone)]
pub enum AdapterConfig {
    Claude(ClaudeConfig),
    Codex,
    Gemini,
}

impl AdapterConfig {
    pub fn engine(&self) -> EngineKind {
        match self {
            AdapterConfig::Claude(_) => EngineKind::Claude,
            AdapterConfig::Codex => EngineKind::Codex,
            AdapterConfig::Gemini => EngineKind::Gemini,
        }
    }
}

/// Build the adapter for an engine with default settings.
pub fn create_adapter(engine: EngineKind) -> Arc<dyn EngineAdapter> {
    match engine {
        EngineKind::Claude => Arc::new(ClaudeAdapter::new(ClaudeConfig::default())),
        EngineKind::Codex => Arc::new(CodexAdapter),
        EngineKind::Gemini => Arc::new(GeminiAdapter),
    }
}

/// Build an adapter from explicit settings.
pub fn create_adapter_with_config(config: AdapterConfig) -> Arc<dyn EngineAdapter> {
    match config {
        AdapterConfig::Claude(claude) => Arc::new(ClaudeAdapter::new(claude)),
        AdapterConfig::Codex => Arc::new(CodexAdapter),
        AdapterConfig::Gemini => Arc::new(GeminiAdapter),
    }
}
