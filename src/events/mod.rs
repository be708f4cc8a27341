pub mod roster;

use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    users::{store, UserBrief},
    AppError, AppResult, AppState, FieldError,
};

pub use roster::{Event, NewEvent};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/{id}", get(get_event).delete(delete_event))
        .route("/{id}/register", post(register))
        .route("/{id}/unregister", delete(unregister))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventView {
    id: Uuid,
    title: String,
    description: String,
    date: String,
    time: String,
    location: String,
    #[serde(rename = "type")]
    event_type: String,
    organizer: UserBrief,
    attendees: Vec<UserBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_attendees: Option<i64>,
    created_at: i64,
}

async fn event_view(pool: &SqlitePool, event: Event) -> AppResult<EventView> {
    let organizer = store::brief(pool, event.organizer_id).await?;

    let ids = roster::attendees(pool, event.id).await?;
    let mut attendees = Vec::with_capacity(ids.len());
    for id in ids {
        attendees.push(store::brief(pool, id).await?);
    }

    Ok(EventView {
        id: event.id,
        title: event.title,
        description: event.description,
        date: event.date,
        time: event.time,
        location: event.location,
        event_type: event.event_type,
        organizer,
        attendees,
        max_attendees: event.max_attendees,
        created_at: event.created_at,
    })
}

#[debug_handler(state = AppState)]
async fn list_events(
    State(db_pool): State<SqlitePool>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<EventView>>> {
    let events = roster::list(&db_pool).await?;

    let mut views = Vec::with_capacity(events.len());
    for event in events {
        views.push(event_view(&db_pool, event).await?);
    }

    Ok(Json(views))
}

#[debug_handler(state = AppState)]
async fn get_event(
    State(db_pool): State<SqlitePool>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventView>> {
    let event = roster::fetch(&db_pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))?;

    Ok(Json(event_view(&db_pool, event).await?))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct CreateEvent {
    title: String,
    description: String,
    date: String,
    time: String,
    location: String,
    #[serde(rename = "type")]
    event_type: String,
    max_attendees: Option<i64>,
}

impl CreateEvent {
    fn validate(self) -> Result<NewEvent, Vec<FieldError>> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("date", &self.date),
            ("time", &self.time),
            ("location", &self.location),
            ("type", &self.event_type),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, format!("{field} is required")));
            }
        }

        if self.max_attendees.is_some_and(|n| n < 1) {
            errors.push(FieldError::new(
                "maxAttendees",
                "maxAttendees must be positive",
            ));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewEvent {
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            location: self.location,
            event_type: self.event_type,
            max_attendees: self.max_attendees,
        })
    }
}

#[debug_handler(state = AppState)]
async fn create_event(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateEvent>,
) -> AppResult<(StatusCode, Json<EventView>)> {
    let fields = req.validate().map_err(AppError::Validation)?;
    let event = roster::create(&db_pool, user.id, user.role(), fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(event_view(&db_pool, event).await?),
    ))
}

#[debug_handler(state = AppState)]
async fn register(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventView>> {
    roster::register(&db_pool, id, user.id).await?;

    let event = roster::fetch(&db_pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))?;
    Ok(Json(event_view(&db_pool, event).await?))
}

#[debug_handler(state = AppState)]
async fn unregister(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventView>> {
    roster::unregister(&db_pool, id, user.id).await?;

    let event = roster::fetch(&db_pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))?;
    Ok(Json(event_view(&db_pool, event).await?))
}

#[debug_handler(state = AppState)]
async fn delete_event(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    roster::delete(&db_pool, id, user.id).await?;
    Ok(Json(json!({ "message": "Event deleted successfully" })))
}
