use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, users, AppError, AppResult};

#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: Uuid,
    /// Stored normalized: participants[0] < participants[1] by uuid order.
    pub participants: [Uuid; 2],
    pub last_message: String,
    pub last_message_at: i64,
}

impl Conversation {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }
}

/// Canonical key for an unordered pair.
fn pair_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b { (a, b) } else { (b, a) }
}

/// Returns the one conversation for the pair, creating it on first contact.
/// The UNIQUE(participant_lo, participant_hi) index is the arbiter under
/// concurrent first calls: losing the insert race means re-reading the
/// winner's row, never surfacing an error or a duplicate.
pub async fn get_or_create(pool: &SqlitePool, a: Uuid, b: Uuid) -> AppResult<Conversation> {
    if a == b {
        return Err(AppError::invalid(
            "Cannot start a conversation with yourself",
        ));
    }

    if !users::store::exists(pool, a).await? || !users::store::exists(pool, b).await? {
        return Err(AppError::not_found("User not found"));
    }

    let (lo, hi) = pair_key(a, b);
    if let Some(existing) = fetch_by_pair(pool, lo, hi).await? {
        return Ok(existing);
    }

    let id = Uuid::now_v7();
    let now = db::now_ms();
    let result = sqlx::query(
        "INSERT INTO conversations (id,participant_lo,participant_hi,last_message,last_message_at) \
         VALUES (?,?,?,'',?)",
    )
    .bind(id.to_string())
    .bind(lo.to_string())
    .bind(hi.to_string())
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(Conversation {
            id,
            participants: [lo, hi],
            last_message: String::new(),
            last_message_at: now,
        }),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            // someone else just created it
            fetch_by_pair(pool, lo, hi)
                .await?
                .ok_or_else(|| anyhow::anyhow!("conversation missing after unique violation").into())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn fetch(pool: &SqlitePool, id: Uuid) -> AppResult<Option<Conversation>> {
    let row: Option<(String, String, String, String, i64)> = sqlx::query_as(
        "SELECT id,participant_lo,participant_hi,last_message,last_message_at \
         FROM conversations WHERE id=?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

async fn fetch_by_pair(pool: &SqlitePool, lo: Uuid, hi: Uuid) -> AppResult<Option<Conversation>> {
    let row: Option<(String, String, String, String, i64)> = sqlx::query_as(
        "SELECT id,participant_lo,participant_hi,last_message,last_message_at \
         FROM conversations WHERE participant_lo=? AND participant_hi=?",
    )
    .bind(lo.to_string())
    .bind(hi.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

/// The caller's conversations, most recent activity first.
pub async fn list_for_user(pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<Conversation>> {
    let rows: Vec<(String, String, String, String, i64)> = sqlx::query_as(
        "SELECT id,participant_lo,participant_hi,last_message,last_message_at \
         FROM conversations WHERE participant_lo=? OR participant_hi=? \
         ORDER BY last_message_at DESC",
    )
    .bind(user_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(from_row).collect()
}

/// Called by the message log after a successful send.
pub async fn record_activity(
    pool: &SqlitePool,
    conversation_id: Uuid,
    text: &str,
    at: i64,
) -> AppResult<()> {
    sqlx::query("UPDATE conversations SET last_message=?, last_message_at=? WHERE id=?")
        .bind(text)
        .bind(at)
        .bind(conversation_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

fn from_row(
    (id, lo, hi, last_message, last_message_at): (String, String, String, String, i64),
) -> AppResult<Conversation> {
    Ok(Conversation {
        id: Uuid::parse_str(&id).map_err(anyhow::Error::from)?,
        participants: [
            Uuid::parse_str(&lo).map_err(anyhow::Error::from)?,
            Uuid::parse_str(&hi).map_err(anyhow::Error::from)?,
        ],
        last_message,
        last_message_at,
    })
}
