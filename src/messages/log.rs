use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, AppError, AppResult};

use super::registry::{self, Conversation};

#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: i64,
    pub read: bool,
}

/// Appends a message and bumps the conversation's last-message fields.
/// A crash between the two writes leaves a stale last_message, which readers
/// tolerate and the next successful send corrects.
pub async fn append(
    pool: &SqlitePool,
    conversation_id: Uuid,
    sender_id: Uuid,
    content: &str,
) -> AppResult<Message> {
    let conversation = require(pool, conversation_id).await?;
    if !conversation.has_participant(sender_id) {
        return Err(AppError::forbidden("Access denied"));
    }

    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::invalid("Message content is required"));
    }

    let id = Uuid::now_v7();
    let created_at = db::now_ms();
    sqlx::query(
        "INSERT INTO messages (id,conversation_id,sender_id,content,created_at,read) \
         VALUES (?,?,?,?,?,0)",
    )
    .bind(id.to_string())
    .bind(conversation_id.to_string())
    .bind(sender_id.to_string())
    .bind(content)
    .bind(created_at)
    .execute(pool)
    .await?;

    registry::record_activity(pool, conversation_id, content, created_at).await?;

    Ok(Message {
        id,
        conversation_id,
        sender_id,
        content: content.to_owned(),
        created_at,
        read: false,
    })
}

/// Full history replay, oldest first. Timestamp collisions break on the
/// storage-assigned insert sequence, so repeated reads are identical.
pub async fn list_for(
    pool: &SqlitePool,
    conversation_id: Uuid,
    requesting_user: Uuid,
) -> AppResult<Vec<Message>> {
    let conversation = require(pool, conversation_id).await?;
    if !conversation.has_participant(requesting_user) {
        return Err(AppError::forbidden("Access denied"));
    }

    let rows: Vec<(String, String, String, i64, bool)> = sqlx::query_as(
        "SELECT id,sender_id,content,created_at,read FROM messages \
         WHERE conversation_id=? ORDER BY created_at ASC, seq ASC",
    )
    .bind(conversation_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, sender_id, content, created_at, read)| {
            Ok(Message {
                id: Uuid::parse_str(&id).map_err(anyhow::Error::from)?,
                conversation_id,
                sender_id: Uuid::parse_str(&sender_id).map_err(anyhow::Error::from)?,
                content,
                created_at,
                read,
            })
        })
        .collect()
}

/// Flips read to true. Marking an already-read message is a no-op.
pub async fn mark_read(
    pool: &SqlitePool,
    message_id: Uuid,
    requesting_user: Uuid,
) -> AppResult<Message> {
    let row: Option<(String, String, String, i64, bool)> = sqlx::query_as(
        "SELECT conversation_id,sender_id,content,created_at,read FROM messages WHERE id=?",
    )
    .bind(message_id.to_string())
    .fetch_optional(pool)
    .await?;

    let (conversation_id, sender_id, content, created_at, read) =
        row.ok_or_else(|| AppError::not_found("Message not found"))?;
    let conversation_id = Uuid::parse_str(&conversation_id).map_err(anyhow::Error::from)?;

    let conversation = require(pool, conversation_id).await?;
    if !conversation.has_participant(requesting_user) {
        return Err(AppError::forbidden("Access denied"));
    }

    if !read {
        sqlx::query("UPDATE messages SET read=1 WHERE id=?")
            .bind(message_id.to_string())
            .execute(pool)
            .await?;
    }

    Ok(Message {
        id: message_id,
        conversation_id,
        sender_id: Uuid::parse_str(&sender_id).map_err(anyhow::Error::from)?,
        content,
        created_at,
        read: true,
    })
}

async fn require(pool: &SqlitePool, conversation_id: Uuid) -> AppResult<Conversation> {
    registry::fetch(pool, conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation not found"))
}
