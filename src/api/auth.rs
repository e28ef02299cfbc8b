use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{ApiError, AppState, LoginResponse, MessageResponse, UserDto};
use crate::config::AuthThrottleConfig;
use crate::services::RegisterInput;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

// ============================================================================
// Login Throttle
// ============================================================================

/// In-process sliding-window counter keyed by client address. State is lost
/// on restart; the window is short enough that this is acceptable.
pub struct LoginThrottle {
    max_attempts: u32,
    window: Duration,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl LoginThrottle {
    #[must_use]
    pub fn new(config: &AuthThrottleConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window: Duration::from_secs(config.window_seconds),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Records an attempt and reports whether it is still within the
    /// window's allowance. Counts every attempt, successful or not.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());

        let entry = attempts.entry(key.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < self.window);

        if entry.len() >= self.max_attempts as usize {
            return false;
        }

        entry.push(now);
        true
    }
}

/// Throttle identity: first forwarded-for hop, then x-real-ip, then a shared
/// local bucket. Good enough behind a trusted proxy; not a security boundary.
fn client_key(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
    {
        return value.trim().to_string();
    }

    "local".to_string()
}

// ============================================================================
// Middleware
// ============================================================================

/// Bearer-token middleware for the protected routes. A missing or malformed
/// header is 401; a header that carries a token we cannot verify is 403.
/// Verified claims are attached to the request for downstream handlers.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated("Missing bearer token".to_string()))?
        .to_string();

    let claims = state
        .sessions()
        .verify(&token)
        .map_err(|_| ApiError::Forbidden("Invalid or expired token".to_string()))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let key = client_key(&headers);
    if !state.login_throttle().check(&key) {
        return Err(ApiError::TooManyRequests(
            "Too many login attempts, try again later".to_string(),
        ));
    }

    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let (user, access_token) = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    tracing::info!("User logged in: {}", user.username);

    Ok(Json(LoginResponse {
        user: user.into(),
        access_token,
    }))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let user = state
        .auth_service()
        .register(RegisterInput {
            username: payload.username,
            display_name: payload.display_name,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    tracing::info!("User registered: {}", user.username);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/forgotpassword
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    state.auth_service().forgot_password(&payload.email).await?;

    Ok(Json(MessageResponse::new("Reset email sent")))
}

/// PATCH /auth/resetpassword/{token}
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(token): axum::extract::Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth_service()
        .reset_password(&token, &payload.password)
        .await?;

    Ok(Json(MessageResponse::new("Password has been reset")))
}
