// SPDX-License-Identifier: MIT

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::PublicUser;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Middleware that requires a valid access token.
///
/// Extraction prefers the access-token cookie and falls back to an
/// `Authorization: Bearer` header. Every verification failure (absent,
/// malformed, bad signature, expired) surfaces as the same 401; the cause is
/// only distinguished in logs. On success the sanitized identity is attached
/// to the request extensions — the only request-scoped state this middleware
/// mutates.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(AppError::Unauthenticated),
        }
    };

    let claims = state.tokens.verify_access(&token).map_err(|e| {
        tracing::debug!(reason = %e, "Access token rejected");
        AppError::Unauthenticated
    })?;

    // A signed token for a vanished identity is not a session.
    let user = state
        .db
        .find_user_by_id(&claims.sub)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    request.extensions_mut().insert(PublicUser::from(&user));

    Ok(next.run(request).await)
}
