use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::RoundtableError;

/// Which coding agent engine answers for a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Claude,
    Codex,
    Gemini,
}

impl Default for EngineKind {
    fn default() -> Self {
        EngineKind::Claude
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Claude => write!(f, "claude"),
            EngineKind::Codex => write!(f, "codex"),
            EngineKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for EngineKind {
    type Err = RoundtableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(EngineKind::Claude),
            "codex" => Ok(EngineKind::Codex),
            "gemini" => Ok(EngineKind::Gemini),
            other => Err(RoundtableError::UnknownEngine(other.to_string())),
        }
    }
}

/// An agent seat in a room, bound to a local repository checkout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub room_id: i64,
    pub name: String,
    pub repo_path: String,
    pub engine: EngineKind,
    pub sort_order: i64,
    pub context: Option<String>,
    pub api_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert parameters for a new member. Sort order starts at the table
/// default and is assigned explicitly through reordering.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub room_id: i64,
    pub name: String,
    pub repo_path: String,
    pub engine: EngineKind,
    pub context: Option<String>,
    pub api_key: Option<String>,
}
