mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::RoundtableResult;
use crate::models::{
    ContextSource, Member, Message, MessageWithSender, NewContextSource, NewMember, NewMessage,
    Room,
};

/// Persistence operations behind the chat engine.
///
/// The orchestrator only sees this trait, so tests can swap in an
/// in-memory store and the HTTP layer can share one handle with the
/// round loop.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------
    async fn create_room(&self, name: &str) -> RoundtableResult<Room>;

    /// All rooms, newest first.
    async fn get_rooms(&self) -> RoundtableResult<Vec<Room>>;

    async fn get_room(&self, id: i64) -> RoundtableResult<Option<Room>>;

    async fn delete_room(&self, id: i64) -> RoundtableResult<bool>;

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------
    async fn create_member(&self, member: NewMember) -> RoundtableResult<Member>;

    /// Members of a room in display order (`sort_order ASC, id ASC`).
    async fn get_members(&self, room_id: i64) -> RoundtableResult<Vec<Member>>;

    async fn get_member(&self, id: i64) -> RoundtableResult<Option<Member>>;

    async fn delete_member(&self, id: i64) -> RoundtableResult<bool>;

    async fn update_member_order(&self, id: i64, sort_order: i64) -> RoundtableResult<()>;

    /// Assign `sort_order = position` for every id in `ordered_ids`.
    /// Ids that no longer exist are skipped.
    async fn reorder_members(&self, ordered_ids: &[i64]) -> RoundtableResult<()>;

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------
    async fn create_message(&self, message: NewMessage) -> RoundtableResult<Message>;

    /// Chronological transcript with sender names, capped at `limit` rows
    /// from the start of the room.
    async fn get_messages(
        &self,
        room_id: i64,
        limit: i64,
    ) -> RoundtableResult<Vec<MessageWithSender>>;

    /// The latest `limit` messages, returned oldest-to-newest.
    async fn get_recent_messages(
        &self,
        room_id: i64,
        limit: i64,
    ) -> RoundtableResult<Vec<MessageWithSender>>;

    // ------------------------------------------------------------------
    // Context sources
    // ------------------------------------------------------------------
    async fn create_context_source(
        &self,
        source: NewContextSource,
    ) -> RoundtableResult<ContextSource>;

    /// A member's sources in creation order.
    async fn get_context_sources(&self, member_id: i64) -> RoundtableResult<Vec<ContextSource>>;

    /// Sources for a batch of members in one query, creation order.
    /// An empty id slice returns an empty list without touching the
    /// database.
    async fn get_context_sources_by_member_ids(
        &self,
        member_ids: &[i64],
    ) -> RoundtableResult<Vec<ContextSource>>;

    async fn delete_context_source(&self, id: i64) -> RoundtableResult<bool>;
}
