//! Job board. Ownership-gated CRUD, no invariants beyond the poster check.

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
        .route("/", get(list_jobs).post(create_job))
        .route("/{id}", get(get_job).put(update_job).delete(delete_job))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobView {
    id: Uuid,
    title: String,
    company: String,
    location: String,
    #[serde(rename = "type")]
    job_type: String,
    salary: String,
    description: String,
    requirements: Vec<String>,
    responsibilities: Vec<String>,
    application_link: String,
    posted_by: UserBrief,
    created_at: i64,
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    title: String,
    company: String,
    location: String,
    job_type: String,
    salary: String,
    description: String,
    requirements: String,
    responsibilities: String,
    application_link: String,
    posted_by: String,
    created_at: i64,
}

const JOB_COLUMNS: &str = "id,title,company,location,job_type,salary,description,requirements,responsibilities,application_link,posted_by,created_at";

async fn view(pool: &SqlitePool, row: JobRow) -> AppResult<JobView> {
    let posted_by = Uuid::parse_str(&row.posted_by).map_err(anyhow::Error::from)?;
    Ok(JobView {
        id: Uuid::parse_str(&row.id).map_err(anyhow::Error::from)?,
        title: row.title,
        company: row.company,
        location: row.location,
        job_type: row.job_type,
        salary: row.salary,
        description: row.description,
        requirements: serde_json::from_str(&row.requirements).map_err(anyhow::Error::from)?,
        responsibilities: serde_json::from_str(&row.responsibilities)
            .map_err(anyhow::Error::from)?,
        application_link: row.application_link,
        posted_by: store::brief(pool, posted_by).await?,
        created_at: row.created_at,
    })
}

#[debug_handler(state = AppState)]
async fn list_jobs(
    State(db_pool): State<SqlitePool>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<JobView>>> {
    let rows: Vec<JobRow> =
        sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC"))
            .fetch_all(&db_pool)
            .await?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(view(&db_pool, row).await?);
    }

    Ok(Json(views))
}

async fn fetch(pool: &SqlitePool, id: Uuid) -> AppResult<JobRow> {
    sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id=?"))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Job not found"))
}

#[debug_handler(state = AppState)]
async fn get_job(
    State(db_pool): State<SqlitePool>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JobView>> {
    let row = fetch(&db_pool, id).await?;
    Ok(Json(view(&db_pool, row).await?))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct JobPayload {
    title: String,
    company: String,
    location: String,
    #[serde(rename = "type")]
    job_type: String,
    salary: String,
    description: String,
    requirements: Vec<String>,
    responsibilities: Vec<String>,
    application_link: String,
}

#[debug_handler(state = AppState)]
async fn create_job(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<JobPayload>,
) -> AppResult<(StatusCode, Json<JobView>)> {
    if user.role() != Role::Alumni {
        return Err(AppError::forbidden("Only alumni can post jobs"));
    }

    if req.title.trim().is_empty() || req.company.trim().is_empty() {
        return Err(AppError::invalid("Title and company are required"));
    }

    let id = Uuid::now_v7();
    sqlx::query(&format!("INSERT INTO jobs ({JOB_COLUMNS}) VALUES (?,?,?,?,?,?,?,?,?,?,?,?)"))
        .bind(id.to_string())
        .bind(&req.title)
        .bind(&req.company)
        .bind(&req.location)
        .bind(&req.job_type)
        .bind(&req.salary)
        .bind(&req.description)
        .bind(serde_json::to_string(&req.requirements).map_err(anyhow::Error::from)?)
        .bind(serde_json::to_string(&req.responsibilities).map_err(anyhow::Error::from)?)
        .bind(&req.application_link)
        .bind(user.id.to_string())
        .bind(db::now_ms())
        .execute(&db_pool)
        .await?;

    let row = fetch(&db_pool, id).await?;
    Ok((StatusCode::CREATED, Json(view(&db_pool, row).await?)))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct JobUpdate {
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    #[serde(rename = "type")]
    job_type: Option<String>,
    salary: Option<String>,
    description: Option<String>,
    requirements: Option<Vec<String>>,
    responsibilities: Option<Vec<String>>,
    application_link: Option<String>,
}

#[debug_handler(state = AppState)]
async fn update_job(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<JobUpdate>,
) -> AppResult<Json<JobView>> {
    let row = fetch(&db_pool, id).await?;
    if row.posted_by != user.id.to_string() {
        return Err(AppError::forbidden("Not authorized to update this job"));
    }

    let requirements = req
        .requirements
        .map(|r| serde_json::to_string(&r))
        .transpose()
        .map_err(anyhow::Error::from)?;
    let responsibilities = req
        .responsibilities
        .map(|r| serde_json::to_string(&r))
        .transpose()
        .map_err(anyhow::Error::from)?;

    sqlx::query(
        "UPDATE jobs SET title=COALESCE(?,title), company=COALESCE(?,company), \
         location=COALESCE(?,location), job_type=COALESCE(?,job_type), \
         salary=COALESCE(?,salary), description=COALESCE(?,description), \
         requirements=COALESCE(?,requirements), responsibilities=COALESCE(?,responsibilities), \
         application_link=COALESCE(?,application_link) WHERE id=?",
    )
    .bind(req.title)
    .bind(req.company)
    .bind(req.location)
    .bind(req.job_type)
    .bind(req.salary)
    .bind(req.description)
    .bind(requirements)
    .bind(responsibilities)
    .bind(req.application_link)
    .bind(id.to_string())
    .execute(&db_pool)
    .await?;

    let row = fetch(&db_pool, id).await?;
    Ok(Json(view(&db_pool, row).await?))
}

#[debug_handler(state = AppState)]
async fn delete_job(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let row = fetch(&db_pool, id).await?;
    if row.posted_by != user.id.to_string() {
        return Err(AppError::forbidden("Not authorized to delete this job"));
    }

    sqlx::query("DELETE FROM jobs WHERE id=?")
        .bind(id.to_string())
        .execute(&db_pool)
        .await?;

    Ok(Json(json!({ "message": "Job deleted successfully" })))
}
