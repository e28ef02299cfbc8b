//! Password-reset flow: issuance, consumption, expiry, overwrite, and
//! delivery-failure rollback, driven through the HTTP surface with a
//! recording mailer injected in place of the relay client.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use notedesk::clients::{Mailer, MemoryMailer};
use notedesk::config::Config;
use notedesk::db::Store;
use notedesk::services::auth_service_impl::hash_reset_secret;
use notedesk::state::SharedState;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<MemoryMailer>, Store) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.security.auth_throttle.max_attempts = 100;

    let store = Store::with_pool_options(&config.general.database_path, 1, 1)
        .await
        .expect("Failed to create store");
    let mailer = Arc::new(MemoryMailer::new());

    let shared = Arc::new(SharedState::with_parts(
        config,
        store.clone(),
        mailer.clone() as Arc<dyn Mailer>,
    ));
    let state = notedesk::api::create_app_state(shared);

    (notedesk::api::router(state), mailer, store)
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn register(app: &Router, username: &str, email: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            &json!({
                "username": username,
                "displayName": "Rita Vale",
                "email": email,
                "password": "password123",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    body_json(response).await["id"].as_i64().unwrap()
}

async fn request_reset(app: &Router, email: &str) -> StatusCode {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/auth/forgotpassword",
            &json!({"email": email}),
        ))
        .await
        .unwrap()
        .status()
}

/// The raw secret only ever exists inside the mailed link.
fn secret_from_mail(body: &str) -> String {
    body.split("/resetpassword/")
        .nth(1)
        .expect("mail body has no reset link")
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect()
}

async fn reset_with(app: &Router, secret: &str, password: &str) -> StatusCode {
    app.clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/auth/resetpassword/{secret}"),
            &json!({"password": password}),
        ))
        .await
        .unwrap()
        .status()
}

async fn login_status(app: &Router, username: &str, password: &str) -> StatusCode {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/auth",
            &json!({"username": username, "password": password}),
        ))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_forgot_and_reset_round_trip() {
    let (app, mailer, _store) = spawn_app().await;
    register(&app, "rita", "rita@example.com").await;

    assert_eq!(request_reset(&app, "rita@example.com").await, StatusCode::OK);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "rita@example.com");
    assert_eq!(sent[0].subject, "Reset your password");

    let secret = secret_from_mail(&sent[0].body);
    assert_eq!(secret.len(), 64);

    assert_eq!(reset_with(&app, &secret, "newpassword1").await, StatusCode::OK);

    assert_eq!(
        login_status(&app, "rita", "password123").await,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        login_status(&app, "rita", "newpassword1").await,
        StatusCode::OK
    );

    // Consumed tickets cannot be replayed.
    assert_eq!(
        reset_with(&app, &secret, "anotherpass1").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_unknown_email_is_rejected() {
    let (app, mailer, _store) = spawn_app().await;

    assert_eq!(
        request_reset(&app, "nobody@example.com").await,
        StatusCode::BAD_REQUEST
    );
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_new_request_overwrites_pending_ticket() {
    let (app, mailer, _store) = spawn_app().await;
    register(&app, "rita", "rita@example.com").await;

    assert_eq!(request_reset(&app, "rita@example.com").await, StatusCode::OK);
    assert_eq!(request_reset(&app, "rita@example.com").await, StatusCode::OK);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);

    let first = secret_from_mail(&sent[0].body);
    let second = secret_from_mail(&sent[1].body);
    assert_ne!(first, second);

    assert_eq!(
        reset_with(&app, &first, "newpassword1").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(reset_with(&app, &second, "newpassword1").await, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_ticket_is_rejected() {
    let (app, mailer, store) = spawn_app().await;
    let user_id = register(&app, "rita", "rita@example.com").await;

    assert_eq!(request_reset(&app, "rita@example.com").await, StatusCode::OK);
    let secret = secret_from_mail(&mailer.sent()[0].body);

    // Back-date the issuance past the 60-minute horizon.
    let stale = (chrono::Utc::now() - chrono::Duration::minutes(61)).to_rfc3339();
    store
        .set_reset_ticket(
            i32::try_from(user_id).unwrap(),
            Some(hash_reset_secret(&secret)),
            Some(stale),
        )
        .await
        .unwrap();

    assert_eq!(
        reset_with(&app, &secret, "newpassword1").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_ticket_near_the_horizon_is_still_honored() {
    let (app, mailer, store) = spawn_app().await;
    let user_id = register(&app, "rita", "rita@example.com").await;

    assert_eq!(request_reset(&app, "rita@example.com").await, StatusCode::OK);
    let secret = secret_from_mail(&mailer.sent()[0].body);

    let aged = (chrono::Utc::now() - chrono::Duration::minutes(59)).to_rfc3339();
    store
        .set_reset_ticket(
            i32::try_from(user_id).unwrap(),
            Some(hash_reset_secret(&secret)),
            Some(aged),
        )
        .await
        .unwrap();

    assert_eq!(reset_with(&app, &secret, "newpassword1").await, StatusCode::OK);
}

#[tokio::test]
async fn test_delivery_failure_rolls_the_ticket_back() {
    let (app, mailer, _store) = spawn_app().await;
    register(&app, "rita", "rita@example.com").await;

    mailer.set_failing(true);
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/forgotpassword",
            &json!({"email": "rita@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["isError"], true);
    assert!(mailer.sent().is_empty());

    // The account recovers cleanly once delivery works again.
    mailer.set_failing(false);
    assert_eq!(request_reset(&app, "rita@example.com").await, StatusCode::OK);
    let secret = secret_from_mail(&mailer.sent()[0].body);
    assert_eq!(reset_with(&app, &secret, "newpassword1").await, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_password_is_validated() {
    let (app, mailer, _store) = spawn_app().await;
    register(&app, "rita", "rita@example.com").await;

    assert_eq!(request_reset(&app, "rita@example.com").await, StatusCode::OK);
    let secret = secret_from_mail(&mailer.sent()[0].body);

    assert_eq!(
        reset_with(&app, &secret, "short").await,
        StatusCode::BAD_REQUEST
    );

    // A failed validation leaves the ticket intact.
    assert_eq!(reset_with(&app, &secret, "longenough1").await, StatusCode::OK);
}
