use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{users, AppError, AppState};

/// The acting user, resolved from the request's bearer token.
/// Handlers take this extractor to require authentication.
pub struct CurrentUser(pub users::User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthenticated("No token, authorization denied"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthenticated("No token, authorization denied"))?;

        let user_id = state.keys.verify(token)?;

        users::store::find_by_id(&state.db_pool, user_id)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| AppError::unauthenticated("Token is not valid"))
    }
}
