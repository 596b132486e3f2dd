// SPDX-License-Identifier: MIT

//! User session routes: register, login, logout, token refresh.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::models::{PublicUser, User};
use crate::routes::ApiResponse;
use crate::AppState;

/// Routes that do not require an authenticated session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/user/register", post(register))
        .route("/api/v1/user/loginUser", post(login))
        .route("/api/v1/user/refresh-token", post(refresh_session))
}

/// Routes behind the access-token middleware.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/user/logout", post(logout))
        .route("/api/v1/user/current", get(current_user))
}

// ─── Register ────────────────────────────────────────────────────

/// Multipart fields collected from a registration request.
#[derive(Default)]
struct RegisterForm {
    full_name: String,
    email: String,
    user_name: String,
    password: String,
    avatar: Option<(String, Vec<u8>)>,
    cover_image: Option<(String, Vec<u8>)>,
}

impl RegisterForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "fullName" => form.full_name = text_value(field).await?,
                "Email" => form.email = text_value(field).await?,
                "UserName" => form.user_name = text_value(field).await?,
                "password" => form.password = text_value(field).await?,
                "avatar" => form.avatar = Some(file_value(field).await?),
                "coverImage" => form.cover_image = Some(file_value(field).await?),
                // Unknown parts are ignored rather than rejected
                _ => {}
            }
        }

        Ok(form)
    }

    /// Names of required text fields that are blank after trimming.
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.full_name.trim().is_empty() {
            missing.push("fullName");
        }
        if self.email.trim().is_empty() {
            missing.push("Email");
        }
        if self.user_name.trim().is_empty() {
            missing.push("UserName");
        }
        if self.password.trim().is_empty() {
            missing.push("password");
        }
        missing
    }
}

async fn text_value(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Unreadable form field: {}", e)))
}

async fn file_value(field: axum::extract::multipart::Field<'_>) -> Result<(String, Vec<u8>)> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Unreadable file field: {}", e)))?;
    Ok((file_name, bytes.to_vec()))
}

/// Create a new account.
///
/// Validation order: required fields, avatar presence, handle/email
/// uniqueness. The password is hashed exactly once, inside `User::new`. The
/// record is re-read after creation; failure to find it is treated as a
/// fatal inconsistency, not retried.
async fn register(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = RegisterForm::from_multipart(multipart).await?;

    let missing = form.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let (avatar_name, avatar_bytes) = form
        .avatar
        .as_ref()
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| AppError::Validation("avatar file is required".to_string()))?;

    if state
        .db
        .find_user_by_handle_or_email(&form.user_name, &form.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "User with this handle or email already exists".to_string(),
        ));
    }

    let avatar_url = state.media.store(avatar_name, avatar_bytes).await?;
    let cover_url = match &form.cover_image {
        Some((name, bytes)) if !bytes.is_empty() => Some(state.media.store(name, bytes).await?),
        _ => None,
    };

    let user = User::new(
        &form.full_name,
        &form.email,
        &form.user_name,
        &form.password,
        avatar_url,
        cover_url,
        &state.hasher,
    )?;

    // The store enforces uniqueness authoritatively; the pre-check above only
    // gives a nicer early error.
    state.db.create_user(&user).await?;

    let created = state
        .db
        .find_user_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("User vanished after creation")))?;

    tracing::info!(user_id = %created.id, user_name = %created.user_name, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            201,
            PublicUser::from(&created),
            "User registered successfully",
        )),
    ))
}

// ─── Login ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(rename = "UserName", default)]
    user_name: Option<String>,
    #[serde(rename = "Email", default)]
    email: Option<String>,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct LoginData {
    user: PublicUser,
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

/// Verify credentials and open a session.
///
/// A failed login never mutates the stored refresh token.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let user_name = body.user_name.as_deref().unwrap_or("").trim();
    let email = body.email.as_deref().unwrap_or("").trim();

    if user_name.is_empty() && email.is_empty() {
        return Err(AppError::Validation(
            "UserName or Email is required".to_string(),
        ));
    }
    if body.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    let user = state
        .db
        .find_user_by_handle_or_email(user_name, email)
        .await?
        .ok_or_else(|| AppError::NotFound("No user with this handle or email".to_string()))?;

    if !state.hasher.verify(&body.password, &user.password_hash) {
        return Err(AppError::Unauthorized("Incorrect password".to_string()));
    }

    let (access_token, refresh_token) = issue_session(&state, &user)?;

    state
        .db
        .update_refresh_token(&user.id, Some(refresh_token.clone()))
        .await?;

    tracing::info!(user_id = %user.id, "User logged in");

    let jar = jar
        .add(session_cookie(
            &state,
            ACCESS_TOKEN_COOKIE,
            access_token.clone(),
            state.config.access_token_expiry_secs,
        ))
        .add(session_cookie(
            &state,
            REFRESH_TOKEN_COOKIE,
            refresh_token.clone(),
            state.config.refresh_token_expiry_secs,
        ));

    Ok((
        jar,
        Json(ApiResponse::new(
            200,
            LoginData {
                user: PublicUser::from(&user),
                access_token,
                refresh_token,
            },
            "Login successful",
        )),
    ))
}

// ─── Logout ──────────────────────────────────────────────────────

/// Close the session: drop the stored refresh token, clear both cookies.
/// The identity comes from the auth middleware.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<PublicUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    state.db.update_refresh_token(&identity.id, None).await?;

    tracing::info!(user_id = %identity.id, "User logged out");

    let jar = jar
        .add(removal_cookie(&state, ACCESS_TOKEN_COOKIE))
        .add(removal_cookie(&state, REFRESH_TOKEN_COOKIE));

    Ok((
        jar,
        Json(ApiResponse::new(200, serde_json::json!({}), "Logged out")),
    ))
}

// ─── Refresh ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RefreshRequest {
    #[serde(rename = "refreshToken", default)]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
struct RefreshData {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

/// Rotate the session: verify the presented refresh token, require it to
/// match the stored pointer, then issue and persist a new pair.
///
/// The pointer comparison means a refresh token stops being usable the
/// moment a newer one is issued, even though its signature stays valid
/// until its own expiry.
async fn refresh_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or(AppError::Unauthenticated)?;

    let claims = state.tokens.verify_refresh(&presented).map_err(|e| {
        tracing::debug!(reason = %e, "Refresh token rejected");
        AppError::Unauthenticated
    })?;

    let user = state
        .db
        .find_user_by_id(&claims.sub)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    let current = user.refresh_token.as_deref().unwrap_or("");
    if current.as_bytes().ct_eq(presented.as_bytes()).unwrap_u8() != 1 {
        tracing::warn!(user_id = %user.id, "Refresh token does not match stored token");
        return Err(AppError::Unauthenticated);
    }

    let (access_token, refresh_token) = issue_session(&state, &user)?;

    state
        .db
        .update_refresh_token(&user.id, Some(refresh_token.clone()))
        .await?;

    let jar = jar
        .add(session_cookie(
            &state,
            ACCESS_TOKEN_COOKIE,
            access_token.clone(),
            state.config.access_token_expiry_secs,
        ))
        .add(session_cookie(
            &state,
            REFRESH_TOKEN_COOKIE,
            refresh_token.clone(),
            state.config.refresh_token_expiry_secs,
        ));

    Ok((
        jar,
        Json(ApiResponse::new(
            200,
            RefreshData {
                access_token,
                refresh_token,
            },
            "Session refreshed",
        )),
    ))
}

// ─── Current user ────────────────────────────────────────────────

/// Return the identity attached by the auth middleware.
async fn current_user(
    Extension(identity): Extension<PublicUser>,
) -> Json<ApiResponse<PublicUser>> {
    Json(ApiResponse::new(200, identity, "Current user"))
}

// ─── Helpers ─────────────────────────────────────────────────────

/// Mint the access/refresh pair for a user. Issuance failure is a fatal
/// internal error, not retried.
fn issue_session(state: &AppState, user: &User) -> Result<(String, String)> {
    let access = state
        .tokens
        .issue_access_token(user)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Access token issuance failed: {}", e)))?;
    let refresh = state
        .tokens
        .issue_refresh_token(&user.id)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Refresh token issuance failed: {}", e)))?;
    Ok((access, refresh))
}

/// Session cookie: httpOnly, SameSite=Strict, Secure per config.
fn session_cookie(
    state: &AppState,
    name: &'static str,
    value: String,
    max_age_secs: i64,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(state.config.cookie_secure);
    cookie.set_max_age(time::Duration::seconds(max_age_secs));
    cookie
}

/// Removal cookie with attributes matching the session cookie, so browsers
/// actually drop it.
fn removal_cookie(state: &AppState, name: &'static str) -> Cookie<'static> {
    let mut cookie = session_cookie(state, name, String::new(), 0);
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}
