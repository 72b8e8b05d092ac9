#![allow(
    clippy::needless_borrows_for_generic_args,
    clippy::manual_range_contains,
    clippy::assertions_on_constants,
    clippy::derivable_impls,
    clippy::type_complexity,
    clippy::ptr_arg,
    clippy::if_same_then_else,
    clippy::wrong_self_convention,
    clippy::manual_clamp,
    clippy::map_entry,
    clippy::len_zero,
    dead_code,
    unused_imports,
    unused_variables,
    unused_mut
)]

pub mod adapters;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod store;

pub use adapters::{
    create_adapter, create_adapter_with_config, AdapterConfig, AgentEvent, AgentEventStream,
    AgentTask, ClaudeAdapter, ClaudeConfig, CodexAdapter, EngineAdapter, GeminiAdapter,
    DEFAULT_CLAUDE_MODEL,
};
pub use chat::{
    build_system_prompt, combine_context_sources, context_block_for, format_conversation_history,
    history_with_round_responses, mention_tokens, resolve_targets, EngineTurnRunner,
    OrchestratorConfig, PeerAnswer, RoundEvent, RoundEventStream, TurnOrchestrator, TurnRequest,
    TurnRunner, MAX_CONTEXT_CHARS,
};
pub use config::{
    ensure_config_dir, ensure_data_dir, get_config_dir, get_data_dir, AgentsConfig,
    ClaudeEngineConfig, ConfigLoadError, DatabaseConfig as RoundtableDatabaseConfig, LoggingConfig,
    RoundtableConfig, ServerConfig,
};
pub use db::{
    init_database, init_database_with_path, Database, DatabaseConfig, DatabaseError,
    DEFAULT_DATABASE_PATH,
};
pub use error::{CliErrorDisplay, RoundtableError, RoundtableResult};
pub use extract::{
    extract_pdf, extract_text_file, ExtractedContent, NotionExtractor, UrlExtractor,
};
pub use models::{
    ContextSource, EngineKind, Member, Message, MessageRole, MessageWithSender, NewContextSource,
    NewMember, NewMessage, Room, SourceKind,
};
pub use store::{ConversationStore, SqliteStore};
