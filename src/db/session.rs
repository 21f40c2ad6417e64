use chrono::Utc;
use log::debug;
use sqlx::pool::PoolConnection;
use sqlx::Sqlite;

use super::DbError;
use crate::models::conversation::{ Conversation, Message, NewConversation, NewMessage };

/// Unit of work bound to a single request.
pub struct Session {
    conn: PoolConnection<Sqlite>,
}

impl Session {
    pub(super) fn new(conn: PoolConnection<Sqlite>) -> Self {
        Self { conn }
    }

    pub async fn insert_conversation(
        &mut self,
        new_conversation: NewConversation
    ) -> Result<Conversation, DbError> {
        let created_at = new_conversation.created_at.unwrap_or_else(Utc::now);

        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversation (title, created_at)
            VALUES (?, ?)
            RETURNING id, title, created_at
            "#
        )
            .bind(&new_conversation.title)
            .bind(created_at)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(conversation)
    }

    pub async fn list_conversations(
        &mut self,
        offset: i64,
        limit: i64
    ) -> Result<Vec<Conversation>, DbError> {
        let conversations = sqlx::query_as::<_, Conversation>(
            "SELECT id, title, created_at FROM conversation ORDER BY id LIMIT ? OFFSET ?"
        )
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(conversations)
    }

    pub async fn get_conversation(&mut self, id: i64) -> Result<Option<Conversation>, DbError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT id, title, created_at FROM conversation WHERE id = ?"
        )
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(conversation)
    }

    /// The conversation together with every message it owns, oldest first.
    pub async fn get_conversation_with_messages(
        &mut self,
        id: i64
    ) -> Result<(Conversation, Vec<Message>), DbError> {
        let conversation = self
            .get_conversation(id).await?
            .ok_or_else(|| DbError::not_found("Conversation", id))?;
        let messages = self.list_messages(id).await?;
        Ok((conversation, messages))
    }

    /// Removes the conversation; its messages go with it via the cascade rule.
    pub async fn delete_conversation(&mut self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM conversation WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Conversation", id));
        }
        debug!("Deleted conversation {}", id);
        Ok(())
    }

    pub async fn insert_message(&mut self, new_message: NewMessage) -> Result<Message, DbError> {
        let created_at = new_message.created_at.unwrap_or_else(Utc::now);

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO message (conversation_id, content, role, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, conversation_id, content, role, created_at
            "#
        )
            .bind(new_message.conversation_id)
            .bind(&new_message.content)
            .bind(&new_message.role)
            .bind(created_at)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(message)
    }

    /// Messages of one conversation by creation time, ties broken by id.
    pub async fn list_messages(&mut self, conversation_id: i64) -> Result<Vec<Message>, DbError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, content, role, created_at
            FROM message
            WHERE conversation_id = ?
            ORDER BY created_at ASC, id ASC
            "#
        )
            .bind(conversation_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(messages)
    }

    pub async fn count_messages(&mut self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM message")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }
}
