pub mod model;
pub mod store;

use axum::{
    debug_handler,
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{auth::CurrentUser, AppError, AppResult, AppState};

pub use model::{Role, RoleDetails, User, UserBrief, UserView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/alumni", get(list_alumni))
        .route("/students", get(list_students))
        .route("/profile", put(update_profile))
        .route("/{id}", get(get_user))
}

#[debug_handler(state = AppState)]
async fn list_alumni(
    State(db_pool): State<SqlitePool>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<UserView>>> {
    let alumni = store::list_by_role(&db_pool, Role::Alumni).await?;
    Ok(Json(alumni.into_iter().map(UserView::from).collect()))
}

#[debug_handler(state = AppState)]
async fn list_students(
    State(db_pool): State<SqlitePool>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<UserView>>> {
    let students = store::list_by_role(&db_pool, Role::Student).await?;
    Ok(Json(students.into_iter().map(UserView::from).collect()))
}

#[derive(Deserialize)]
struct ProfileUpdate {
    name: Option<String>,
    email: Option<String>,
    bio: Option<String>,
}

#[debug_handler(state = AppState)]
async fn update_profile(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(ProfileUpdate { name, email, bio }): Json<ProfileUpdate>,
) -> AppResult<Json<UserView>> {
    let email = email.map(|e| e.trim().to_lowercase());
    let updated = store::update_profile(
        &db_pool,
        user.id,
        store::ProfilePatch { name, email, bio },
    )
    .await?;

    Ok(Json(UserView::from(updated)))
}

#[debug_handler(state = AppState)]
async fn get_user(
    State(db_pool): State<SqlitePool>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserView>> {
    let user = store::find_by_id(&db_pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserView::from(user)))
}
