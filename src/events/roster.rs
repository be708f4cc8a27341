use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, users::Role, AppError, AppResult};

#[derive(Debug, Clone)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub event_type: String,
    pub organizer_id: Uuid,
    pub max_attendees: Option<i64>,
    pub created_at: i64,
}

pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub event_type: String,
    pub max_attendees: Option<i64>,
}

pub async fn create(
    pool: &SqlitePool,
    organizer_id: Uuid,
    organizer_role: Role,
    fields: NewEvent,
) -> AppResult<Event> {
    if organizer_role != Role::Alumni {
        return Err(AppError::forbidden("Only alumni can create events"));
    }

    let id = Uuid::now_v7();
    let created_at = db::now_ms();
    sqlx::query(
        "INSERT INTO events (id,title,description,date,time,location,event_type,organizer_id,max_attendees,created_at) \
         VALUES (?,?,?,?,?,?,?,?,?,?)",
    )
    .bind(id.to_string())
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.date)
    .bind(&fields.time)
    .bind(&fields.location)
    .bind(&fields.event_type)
    .bind(organizer_id.to_string())
    .bind(fields.max_attendees)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(Event {
        id,
        title: fields.title,
        description: fields.description,
        date: fields.date,
        time: fields.time,
        location: fields.location,
        event_type: fields.event_type,
        organizer_id,
        max_attendees: fields.max_attendees,
        created_at,
    })
}

pub async fn fetch(pool: &SqlitePool, id: Uuid) -> AppResult<Option<Event>> {
    let row: Option<EventRow> = sqlx::query_as(
        "SELECT id,title,description,date,time,location,event_type,organizer_id,max_attendees,created_at \
         FROM events WHERE id=?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(Event::try_from).transpose()
}

/// Upcoming-first listing by event date.
pub async fn list(pool: &SqlitePool) -> AppResult<Vec<Event>> {
    let rows: Vec<EventRow> = sqlx::query_as(
        "SELECT id,title,description,date,time,location,event_type,organizer_id,max_attendees,created_at \
         FROM events ORDER BY date ASC",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Event::try_from).collect()
}

pub async fn attendees(pool: &SqlitePool, event_id: Uuid) -> AppResult<Vec<Uuid>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT user_id FROM event_attendees WHERE event_id=? ORDER BY rowid")
            .bind(event_id.to_string())
            .fetch_all(pool)
            .await?;

    rows.into_iter()
        .map(|(id,)| Uuid::parse_str(&id).map_err(|e| anyhow::Error::from(e).into()))
        .collect()
}

/// Admission policy, checked in order: existence, already-registered,
/// capacity. The capacity check and the insert are one guarded statement so
/// two registrations racing for the last slot cannot both get in; a
/// primary-key violation means a concurrent duplicate and reads as
/// already-registered, never as full.
pub async fn register(pool: &SqlitePool, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
    let event = require(pool, event_id).await?;

    if is_attendee(pool, event_id, user_id).await? {
        return Err(AppError::conflict("Already registered for this event"));
    }

    let result = sqlx::query(
        "INSERT INTO event_attendees (event_id, user_id) \
         SELECT ?1, ?2 \
         WHERE ?3 IS NULL \
            OR (SELECT COUNT(*) FROM event_attendees WHERE event_id = ?1) < ?3",
    )
    .bind(event_id.to_string())
    .bind(user_id.to_string())
    .bind(event.max_attendees)
    .execute(pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => Err(AppError::conflict("Event is full")),
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AppError::conflict("Already registered for this event"))
        }
        Err(err) => Err(err.into()),
    }
}

/// Removing a non-member is a success no-op, so retries are safe.
pub async fn unregister(pool: &SqlitePool, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
    require(pool, event_id).await?;

    sqlx::query("DELETE FROM event_attendees WHERE event_id=? AND user_id=?")
        .bind(event_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, event_id: Uuid, requesting_user: Uuid) -> AppResult<()> {
    let event = require(pool, event_id).await?;
    if event.organizer_id != requesting_user {
        return Err(AppError::forbidden("Not authorized to delete this event"));
    }

    sqlx::query("DELETE FROM event_attendees WHERE event_id=?")
        .bind(event_id.to_string())
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM events WHERE id=?")
        .bind(event_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn is_attendee(pool: &SqlitePool, event_id: Uuid, user_id: Uuid) -> AppResult<bool> {
    Ok(sqlx::query_as::<_, (i64,)>(
        "SELECT 1 FROM event_attendees WHERE event_id=? AND user_id=?",
    )
    .bind(event_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?
    .is_some())
}

async fn require(pool: &SqlitePool, event_id: Uuid) -> AppResult<Event> {
    fetch(pool, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: String,
    date: String,
    time: String,
    location: String,
    event_type: String,
    organizer_id: String,
    max_attendees: Option<i64>,
    created_at: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = AppError;

    fn try_from(row: EventRow) -> Result<Self, AppError> {
        Ok(Event {
            id: Uuid::parse_str(&row.id).map_err(anyhow::Error::from)?,
            title: row.title,
            description: row.description,
            date: row.date,
            time: row.time,
            location: row.location,
            event_type: row.event_type,
            organizer_id: Uuid::parse_str(&row.organizer_id).map_err(anyhow::Error::from)?,
            max_attendees: row.max_attendees,
            created_at: row.created_at,
        })
    }
}
