#![allow(dead_code)]

use alumnet::{
    app,
    config::Config,
    db,
    users::{store, RoleDetails, User},
    AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tower::ServiceExt;

pub async fn pool() -> SqlitePool {
    // single connection: one in-memory database shared by every call
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init(&pool).await.unwrap();
    pool
}

pub async fn student(pool: &SqlitePool, email: &str) -> User {
    store::create(
        pool,
        store::NewUser {
            name: format!("Student {email}"),
            email: email.to_owned(),
            password_hash: "unused".to_owned(),
            details: RoleDetails::Student {
                usn: "1MS21CS001".to_owned(),
            },
        },
    )
    .await
    .unwrap()
}

pub async fn alumni(pool: &SqlitePool, email: &str) -> User {
    store::create(
        pool,
        store::NewUser {
            name: format!("Alumni {email}"),
            email: email.to_owned(),
            password_hash: "unused".to_owned(),
            details: RoleDetails::Alumni {
                batch: "2018".to_owned(),
                passing_year: "2022".to_owned(),
                branch: "CSE".to_owned(),
                program: "BE".to_owned(),
            },
        },
    )
    .await
    .unwrap()
}

pub async fn test_app() -> Router {
    let config = Config {
        port: 0,
        database_url: "sqlite::memory:".to_owned(),
        jwt_secret: "test-secret".to_owned(),
        token_ttl_hours: 1,
    };
    app(AppState::new(pool().await, &config))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

/// Registers a user through the API and returns (token, user json).
pub async fn register(app: &Router, payload: Value) -> (String, Value) {
    let (status, body) = send(app, Method::POST, "/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["token"].as_str().unwrap().to_owned(),
        body["user"].clone(),
    )
}

pub fn student_payload(email: &str) -> Value {
    serde_json::json!({
        "name": "Some Student",
        "email": email,
        "password": "secret123",
        "role": "student",
        "usn": "1MS21CS042",
    })
}

pub fn alumni_payload(email: &str) -> Value {
    serde_json::json!({
        "name": "Some Alumni",
        "email": email,
        "password": "secret123",
        "role": "alumni",
        "batch": "2016",
        "passingYear": "2020",
        "branch": "ECE",
        "program": "BE",
    })
}
