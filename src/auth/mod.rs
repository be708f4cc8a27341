mod extract;
mod password;
mod token;

use std::sync::Arc;

use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    users::{self, RoleDetails, UserView},
    AppError, AppResult, AppState, FieldError,
};

pub use extract::CurrentUser;
pub use password::{Argon2Credentials, CredentialHasher};
pub use token::TokenKeys;

pub type Hasher = Arc<dyn CredentialHasher>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[derive(Serialize)]
struct AuthResponse {
    token: String,
    user: UserView,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
    role: String,
    usn: Option<String>,
    batch: Option<String>,
    passing_year: Option<String>,
    branch: Option<String>,
    program: Option<String>,
}

impl RegisterRequest {
    /// Field checks mirror the public validation rules; the role-conditional
    /// requirements are discharged by constructing the typed variant.
    fn validate(self) -> Result<(String, String, String, RoleDetails), Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }

        let email = self.email.trim().to_lowercase();
        if !is_email(&email) {
            errors.push(FieldError::new("email", "Please include a valid email"));
        }

        if self.password.len() < 6 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }

        let details = match self.role.as_str() {
            "student" => required(self.usn, "usn", &mut errors)
                .map(|usn| RoleDetails::Student { usn }),
            "alumni" => {
                let batch = required(self.batch, "batch", &mut errors);
                let passing_year = required(self.passing_year, "passingYear", &mut errors);
                let branch = required(self.branch, "branch", &mut errors);
                let program = required(self.program, "program", &mut errors);
                match (batch, passing_year, branch, program) {
                    (Some(batch), Some(passing_year), Some(branch), Some(program)) => {
                        Some(RoleDetails::Alumni {
                            batch,
                            passing_year,
                            branch,
                            program,
                        })
                    }
                    _ => None,
                }
            }
            _ => {
                errors.push(FieldError::new("role", "Role must be student or alumni"));
                None
            }
        };

        match details {
            Some(details) if errors.is_empty() => Ok((name, email, self.password, details)),
            _ => Err(errors),
        }
    }
}

fn required(
    value: Option<String>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_owned()),
        _ => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
    }
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[debug_handler(state = AppState)]
async fn register(
    State(db_pool): State<SqlitePool>,
    State(keys): State<TokenKeys>,
    State(hasher): State<Hasher>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let (name, email, password, details) = req.validate().map_err(AppError::Validation)?;

    if users::store::find_by_email(&db_pool, &email).await?.is_some() {
        return Err(AppError::conflict("User already exists"));
    }

    let password_hash = hasher.hash(&password)?;
    let user = users::store::create(
        &db_pool,
        users::store::NewUser {
            name,
            email,
            password_hash,
            details,
        },
    )
    .await?;

    tracing::info!(user = %user.id, role = user.role().as_str(), "registered");

    let token = keys.issue(user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserView::from(user),
        }),
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[debug_handler(state = AppState)]
async fn login(
    State(db_pool): State<SqlitePool>,
    State(keys): State<TokenKeys>,
    State(hasher): State<Hasher>,
    Json(LoginRequest { email, password }): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = email.trim().to_lowercase();

    // same response for unknown email and wrong password
    let user = users::store::find_by_email(&db_pool, &email)
        .await?
        .ok_or_else(|| AppError::invalid("Invalid credentials"))?;

    if !hasher.verify(&password, &user.password_hash) {
        return Err(AppError::invalid("Invalid credentials"));
    }

    let token = keys.issue(user.id)?;
    Ok(Json(AuthResponse {
        token,
        user: UserView::from(user),
    }))
}

#[debug_handler(state = AppState)]
async fn me(CurrentUser(user): CurrentUser) -> Json<UserView> {
    Json(UserView::from(user))
}
