use axum::{
    Router,
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod account;
pub mod auth;
mod error;
mod notes;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn sessions(&self) -> &crate::services::SessionKeys {
        &self.shared.sessions
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn crate::services::UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn note_service(&self) -> &Arc<dyn crate::services::NoteService> {
        &self.shared.note_service
    }

    #[must_use]
    pub fn login_throttle(&self) -> &auth::LoginThrottle {
        &self.shared.login_throttle
    }

    #[must_use]
    pub fn request_log(&self) -> &crate::logging::FileLogger {
        &self.shared.request_log
    }
}

pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let app_router = Router::new()
        .merge(protected_routes)
        .route("/auth", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/forgotpassword", post(auth::forgot_password))
        .route("/auth/resetpassword/{token}", patch(auth::reset_password))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    app_router
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(state, track_requests))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/account/{id}", get(account::get_account))
        .route("/account/{id}", patch(account::update_account))
        .route("/account/{id}", put(account::change_password))
        .route("/users", get(users::search_users))
        .route("/users/all", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", patch(users::update_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/notes", get(notes::search_notes))
        .route("/notes/all", get(notes::list_notes))
        .route("/notes", post(notes::create_note))
        .route("/notes/{id}", get(notes::get_note))
        .route("/notes/{id}", patch(notes::update_note))
        .route("/notes/{id}", delete(notes::delete_note))
        .route_layer(middleware::from_fn_with_state(state, auth::require_session))
}

/// Writes one request-log line per request and one error-log line per 5xx
/// response. File writes never fail the request.
async fn track_requests(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let origin = request
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    state.request_log().log_request(&method, &uri, &origin).await;

    let response = next.run(request).await;

    if response.status().is_server_error() {
        state
            .request_log()
            .log_error(&format!("{method} {uri} -> {}", response.status()))
            .await;
    }

    response
}
