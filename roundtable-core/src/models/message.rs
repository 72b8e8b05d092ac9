use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub room_id: i64,
    pub role: MessageRole,
    pub member_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A transcript row joined with the sender's current name. The name is
/// `None` for user messages and for assistant messages whose member was
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MessageWithSender {
    pub id: i64,
    pub room_id: i64,
    pub role: MessageRole,
    pub member_id: Option<i64>,
    pub member_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub room_id: i64,
    pub role: MessageRole,
    pub member_id: Option<i64>,
    pub content: String,
}

impl NewMessage {
    pub fn from_user(room_id: i64, content: impl Into<String>) -> Self {
        Self {
            room_id,
            role: MessageRole::User,
            member_id: None,
            content: content.into(),
        }
    }

    pub fn from_member(room_id: i64, member_id: i64, content: impl Into<String>) -> Self {
        Self {
            room_id,
            role: MessageRole::Assistant,
            member_id: Some(member_id),
            content: content.into(),
        }
    }
}
