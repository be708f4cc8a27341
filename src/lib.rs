pub mod auth;
pub mod blogs;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod jobs;
pub mod messages;
pub mod users;

use std::sync::Arc;

use axum::{extract::FromRef, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use crate::error::{AppError, AppResult, FieldError};

use crate::auth::{Argon2Credentials, Hasher, TokenKeys};
use crate::config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub keys: TokenKeys,
    pub hasher: Hasher,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: &Config) -> Self {
        Self {
            db_pool,
            keys: TokenKeys::new(&config.jwt_secret, config.token_ttl_hours),
            hasher: Arc::new(Argon2Credentials),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/messages", messages::router())
        .nest("/events", events::router())
        .nest("/jobs", jobs::router())
        .nest("/blogs", blogs::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
