use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::RoundtableError;

/// Where a piece of member context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Manual,
    Pdf,
    Url,
    Notion,
    TextFile,
}

impl SourceKind {
    /// Human-readable heading used when sources are combined into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Manual => "Manual Context",
            SourceKind::Pdf => "PDF Document",
            SourceKind::Url => "Web Page",
            SourceKind::Notion => "Notion Page",
            SourceKind::TextFile => "Text File",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Manual => write!(f, "manual"),
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::Url => write!(f, "url"),
            SourceKind::Notion => write!(f, "notion"),
            SourceKind::TextFile => write!(f, "text_file"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = RoundtableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SourceKind::Manual),
            "pdf" => Ok(SourceKind::Pdf),
            "url" => Ok(SourceKind::Url),
            "notion" => Ok(SourceKind::Notion),
            "text_file" => Ok(SourceKind::TextFile),
            _ => Err(RoundtableError::validation("Invalid source type")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContextSource {
    pub id: i64,
    pub member_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContextSource {
    pub member_id: i64,
    pub kind: SourceKind,
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub file_name: Option<String>,
}

impl NewContextSource {
    pub fn manual(member_id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            member_id,
            kind: SourceKind::Manual,
            title: title.into(),
            content: content.into(),
            source_url: None,
            file_name: None,
        }
    }
}
