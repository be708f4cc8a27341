//! Blog articles. Author-gated CRUD, creation restricted to alumni.

use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    db,
    users::{store, Role, UserBrief},
    AppError, AppResult, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_blogs).post(create_blog))
        .route("/{id}", get(get_blog).put(update_blog).delete(delete_blog))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlogView {
    id: Uuid,
    title: String,
    content: String,
    summary: String,
    author: UserBrief,
    created_at: i64,
}

#[derive(sqlx::FromRow)]
struct BlogRow {
    id: String,
    title: String,
    content: String,
    summary: String,
    author_id: String,
    created_at: i64,
}

async fn view(pool: &SqlitePool, row: BlogRow) -> AppResult<BlogView> {
    let author_id = Uuid::parse_str(&row.author_id).map_err(anyhow::Error::from)?;
    Ok(BlogView {
        id: Uuid::parse_str(&row.id).map_err(anyhow::Error::from)?,
        title: row.title,
        content: row.content,
        summary: row.summary,
        author: store::brief(pool, author_id).await?,
        created_at: row.created_at,
    })
}

async fn fetch(pool: &SqlitePool, id: Uuid) -> AppResult<BlogRow> {
    sqlx::query_as(
        "SELECT id,title,content,summary,author_id,created_at FROM blogs WHERE id=?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Blog not found"))
}

#[debug_handler(state = AppState)]
async fn list_blogs(
    State(db_pool): State<SqlitePool>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<BlogView>>> {
    let rows: Vec<BlogRow> = sqlx::query_as(
        "SELECT id,title,content,summary,author_id,created_at FROM blogs ORDER BY created_at DESC",
    )
    .fetch_all(&db_pool)
    .await?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(view(&db_pool, row).await?);
    }

    Ok(Json(views))
}

#[debug_handler(state = AppState)]
async fn get_blog(
    State(db_pool): State<SqlitePool>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BlogView>> {
    let row = fetch(&db_pool, id).await?;
    Ok(Json(view(&db_pool, row).await?))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct BlogPayload {
    title: String,
    content: String,
    summary: String,
}

#[debug_handler(state = AppState)]
async fn create_blog(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<BlogPayload>,
) -> AppResult<(StatusCode, Json<BlogView>)> {
    if user.role() != Role::Alumni {
        return Err(AppError::forbidden("Only alumni can write blogs"));
    }

    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(AppError::invalid("Title and content are required"));
    }

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO blogs (id,title,content,summary,author_id,created_at) VALUES (?,?,?,?,?,?)",
    )
    .bind(id.to_string())
    .bind(&req.title)
    .bind(&req.content)
    .bind(&req.summary)
    .bind(user.id.to_string())
    .bind(db::now_ms())
    .execute(&db_pool)
    .await?;

    let row = fetch(&db_pool, id).await?;
    Ok((StatusCode::CREATED, Json(view(&db_pool, row).await?)))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct BlogUpdate {
    title: Option<String>,
    content: Option<String>,
    summary: Option<String>,
}

#[debug_handler(state = AppState)]
async fn update_blog(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<BlogUpdate>,
) -> AppResult<Json<BlogView>> {
    let row = fetch(&db_pool, id).await?;
    if row.author_id != user.id.to_string() {
        return Err(AppError::forbidden("Not authorized to update this blog"));
    }

    sqlx::query(
        "UPDATE blogs SET title=COALESCE(?,title), content=COALESCE(?,content), \
         summary=COALESCE(?,summary) WHERE id=?",
    )
    .bind(req.title)
    .bind(req.content)
    .bind(req.summary)
    .bind(id.to_string())
    .execute(&db_pool)
    .await?;

    let row = fetch(&db_pool, id).await?;
    Ok(Json(view(&db_pool, row).await?))
}

#[debug_handler(state = AppState)]
async fn delete_blog(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let row = fetch(&db_pool, id).await?;
    if row.author_id != user.id.to_string() {
        return Err(AppError::forbidden("Not authorized to delete this blog"));
    }

    sqlx::query("DELETE FROM blogs WHERE id=?")
        .bind(id.to_string())
        .execute(&db_pool)
        .await?;

    Ok(Json(json!({ "message": "Blog deleted successfully" })))
}
