use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::ConversationStore;
use crate::db::Database;
use crate::error::RoundtableResult;
use crate::models::{
    ContextSource, Member, Message, MessageWithSender, NewContextSource, NewMember, NewMessage,
    Room,
};

/// `ConversationStore` backed by the SQLite pool from [`Database`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn create_room(&self, name: &str) -> RoundtableResult<Room> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (name, created_at)
            VALUES (?, ?)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(room)
    }

    async fn get_rooms(&self) -> RoundtableResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, name, created_at
            FROM rooms
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    async fn get_room(&self, id: i64) -> RoundtableResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, name, created_at
            FROM rooms
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    async fn delete_room(&self, id: i64) -> RoundtableResult<bool> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_member(&self, member: NewMember) -> RoundtableResult<Member> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (room_id, name, repo_path, engine, context, api_key, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, room_id, name, repo_path, engine, sort_order, context, api_key, created_at
            "#,
        )
        .bind(member.room_id)
        .bind(&member.name)
        .bind(&member.repo_path)
        .bind(member.engine)
        .bind(&member.context)
        .bind(&member.api_key)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    async fn get_members(&self, room_id: i64) -> RoundtableResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, room_id, name, repo_path, engine, sort_order, context, api_key, created_at
            FROM members
            WHERE room_id = ?
            ORDER BY sort_order ASC, id ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn get_member(&self, id: i64) -> RoundtableResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, room_id, name, repo_path, engine, sort_order, context, api_key, created_at
            FROM members
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn delete_member(&self, id: i64) -> RoundtableResult<bool> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_member_order(&self, id: i64, sort_order: i64) -> RoundtableResult<()> {
        sqlx::query("UPDATE members SET sort_order = ? WHERE id = ?")
            .bind(sort_order)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn reorder_members(&self, ordered_ids: &[i64]) -> RoundtableResult<()> {
        for (position, id) in ordered_ids.iter().enumerate() {
            self.update_member_order(*id, position as i64).await?;
        }
        Ok(())
    }

    async fn create_message(&self, message: NewMessage) -> RoundtableResult<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (room_id, role, member_id, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, room_id, role, member_id, content, created_at
            "#,
        )
        .bind(message.room_id)
        .bind(message.role)
        .bind(message.member_id)
        .bind(&message.content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn get_messages(
        &self,
        room_id: i64,
        limit: i64,
    ) -> RoundtableResult<Vec<MessageWithSender>> {
        let messages = sqlx::query_as::<_, MessageWithSender>(
            r#"
            SELECT m.id, m.room_id, m.role, m.member_id, mem.name AS member_name,
                   m.content, m.created_at
            FROM messages m
            LEFT JOIN members mem ON mem.id = m.member_id
            WHERE m.room_id = ?
            ORDER BY m.created_at ASC, m.id ASC
            LIMIT ?
            "#,
        )
        .bind(room_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn get_recent_messages(
        &self,
        room_id: i64,
        limit: i64,
    ) -> RoundtableResult<Vec<MessageWithSender>> {
        let messages = sqlx::query_as::<_, MessageWithSender>(
            r#"
            SELECT id, room_id, role, member_id, member_name, content, created_at
            FROM (
                SELECT m.id, m.room_id, m.role, m.member_id, mem.name AS member_name,
                       m.content, m.created_at
                FROM messages m
                LEFT JOIN members mem ON mem.id = m.member_id
                WHERE m.room_id = ?
                ORDER BY m.created_at DESC, m.id DESC
                LIMIT ?
            )
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(room_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn create_context_source(
        &self,
        source: NewContextSource,
    ) -> RoundtableResult<ContextSource> {
        let source = sqlx::query_as::<_, ContextSource>(
            r#"
            INSERT INTO context_sources (member_id, type, title, content, source_url, file_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, member_id, type, title, content, source_url, file_name, created_at
            "#,
        )
        .bind(source.member_id)
        .bind(source.kind)
        .bind(&source.title)
        .bind(&source.content)
        .bind(&source.source_url)
        .bind(&source.file_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(source)
    }

    async fn get_context_sources(&self, member_id: i64) -> RoundtableResult<Vec<ContextSource>> {
        let sources = sqlx::query_as::<_, ContextSource>(
            r#"
            SELECT id, member_id, type, title, content, source_url, file_name, created_at
            FROM context_sources
            WHERE member_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sources)
    }

    async fn get_context_sources_by_member_ids(
        &self,
        member_ids: &[i64],
    ) -> RoundtableResult<Vec<ContextSource>> {
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; member_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, member_id, type, title, content, source_url, file_name, created_at
            FROM context_sources
            WHERE member_id IN ({})
            ORDER BY created_at ASC, id ASC
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, ContextSource>(&sql);
        for id in member_ids {
            query = query.bind(id);
        }

        let sources = query.fetch_all(&self.pool).await?;

        Ok(sources)
    }

    async fn delete_context_source(&self, id: i64) -> RoundtableResult<bool> {
        let result = sqlx::query("DELETE FROM context_sources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
