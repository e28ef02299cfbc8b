use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use notedesk::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Default credentials seeded by the initial migration.
const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "changeme";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A pooled in-memory database is one database per connection; a single
    // connection keeps every query on the same schema.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    // High enough that multi-login tests never trip it.
    config.security.auth_throttle.max_attempts = 100;

    let state = notedesk::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    notedesk::api::router(state)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth",
            None,
            &json!({"username": username, "password": password}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["accessToken"].as_str().unwrap().to_string()
}

async fn create_user(app: &Router, token: &str, username: &str, display_name: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users",
            Some(token),
            &json!({
                "username": username,
                "displayName": display_name,
                "email": format!("{username}@example.com"),
                "password": "password123",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    body_json(response).await["id"].as_i64().unwrap()
}

async fn create_note(app: &Router, token: &str, owner_id: i64, title: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/notes",
            Some(token),
            &json!({"ownerId": owner_id, "title": title, "body": "details"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    body_json(response).await
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/users", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_request("/users", Some("not-a-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let response = app
        .clone()
        .oneshot(get_request("/users", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth",
            None,
            &json!({"username": ADMIN_USERNAME, "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth",
            None,
            &json!({"username": "nobody", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_then_login() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &json!({
                "username": "frank",
                "displayName": "Frank Fields",
                "email": "frank@example.com",
                "password": "password123",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["username"], "frank");
    assert_eq!(body["displayName"], "Frank Fields");
    assert_eq!(body["role"], "employee");
    assert!(body.get("passwordHash").is_none());

    let token = login(&app, "frank", "password123").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_register_conflicts_are_case_insensitive() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &json!({
                "username": "frank",
                "displayName": "Frank",
                "email": "frank@example.com",
                "password": "password123",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &json!({
                "username": "FRANK",
                "displayName": "Other Frank",
                "email": "other@example.com",
                "password": "password123",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &json!({
                "username": "franklin",
                "displayName": "Franklin",
                "email": "frank@example.com",
                "password": "password123",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_ticket_numbers_start_at_500_and_increment() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let first = create_note(&app, &token, 1, "First note").await;
    assert_eq!(first["ticket"], 500);

    let second = create_note(&app, &token, 1, "Second note").await;
    assert_eq!(second["ticket"], 501);
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_gapless_tickets() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let create = |title: &str| {
        let app = app.clone();
        let request = json_request(
            "POST",
            "/notes",
            Some(&token),
            &json!({"ownerId": 1, "title": title, "body": "details"}),
        );
        async move {
            let response = app.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            body_json(response).await["ticket"].as_i64().unwrap()
        }
    };

    // All five creates race through the counter at once; the transactional
    // increment-and-read must hand each one its own number.
    let (a, b, c, d, e) = tokio::join!(
        create("Race one"),
        create("Race two"),
        create("Race three"),
        create("Race four"),
        create("Race five"),
    );

    let mut tickets = vec![a, b, c, d, e];
    tickets.sort_unstable();
    assert_eq!(tickets, vec![500, 501, 502, 503, 504]);
}

#[tokio::test]
async fn test_note_titles_stay_reserved_after_delete() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let note = create_note(&app, &token, 1, "Printer Broken").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/notes",
            Some(&token),
            &json!({"ownerId": 1, "title": "printer broken", "body": "again"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/notes/{}", note["id"]),
            Some(&token),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Soft-deleted rows still count toward title uniqueness.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/notes",
            Some(&token),
            &json!({"ownerId": 1, "title": "Printer Broken", "body": "third"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_user_delete_guard_and_username_release() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let user_id = create_user(&app, &token, "gina", "Gina Hall").await;
    let note = create_note(&app, &token, user_id, "Assigned work").await;

    // Refused while the user still owns a live note.
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/users/{user_id}"),
            Some(&token),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/notes/{}", note["id"]),
            Some(&token),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/users/{user_id}"),
            Some(&token),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Still reachable by id after the soft delete.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/users/{user_id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // But gone from the live listing.
    let response = app
        .clone()
        .oneshot(get_request("/users/all", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(
        body.as_array()
            .unwrap()
            .iter()
            .all(|u| u["id"].as_i64() != Some(user_id))
    );

    // And the username is free for reuse.
    let reused = create_user(&app, &token, "gina", "New Gina").await;
    assert_ne!(reused, user_id);
}

#[tokio::test]
async fn test_orphaned_notes_lose_their_owner_name() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let user_id = create_user(&app, &token, "hugo", "Hugo Lane").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/users/{user_id}"),
            Some(&token),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Reassigning to a soft-deleted owner is tolerated; the reference just
    // stops resolving to a name.
    let note = create_note(&app, &token, 1, "Handover").await;
    assert_eq!(note["ownerName"], "Administrator");

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/notes/{}", note["id"]),
            Some(&token),
            &json!({"ownerId": user_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ownerId"].as_i64(), Some(user_id));
    assert!(body["ownerName"].is_null());
}

#[tokio::test]
async fn test_status_filter_excludes_the_given_value() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    create_note(&app, &token, 1, "Open item").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/notes",
            Some(&token),
            &json!({"ownerId": 1, "title": "Closed item", "body": "done", "status": "closed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/notes?status=closed", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Open item");

    let response = app
        .clone()
        .oneshot(get_request("/notes?status=bogus", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_search_pagination() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    create_user(&app, &token, "ann", "Ann One").await;
    create_user(&app, &token, "ben", "Ben Two").await;
    create_user(&app, &token, "cal", "Cal Three").await;

    let response = app
        .clone()
        .oneshot(get_request("/users?page=1&limit=2", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["total"], 4);
    assert_eq!(body["totalPages"], 2);

    let response = app
        .clone()
        .oneshot(get_request("/users?page=2&limit=2", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_note_term_prefers_owner_names_over_titles() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let dana = create_user(&app, &token, "dana", "Dana Printer").await;
    create_note(&app, &token, dana, "Server rack").await;
    create_note(&app, &token, 1, "printer ink order").await;

    // "printer" matches a display name, so the title branch never runs.
    let response = app
        .clone()
        .oneshot(get_request("/notes?term=printer", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Server rack");

    // No display name contains "rack"; falls through to title matching.
    let response = app
        .clone()
        .oneshot(get_request("/notes?term=rack", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Server rack");
}

#[tokio::test]
async fn test_account_routes_are_self_only() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let other_id = create_user(&app, &token, "eve", "Eve Stone").await;

    let response = app
        .clone()
        .oneshot(get_request("/account/1", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/account/{other_id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/account/1",
            Some(&token),
            &json!({"currentPassword": "wrong", "newPassword": "changeme2!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/account/1",
            Some(&token),
            &json!({"currentPassword": ADMIN_PASSWORD, "newPassword": "changeme2!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    login(&app, ADMIN_USERNAME, "changeme2!").await;
}

#[tokio::test]
async fn test_missing_rows_map_to_bad_request() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(get_request("/notes/9999", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get_request("/users/9999", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_throttle_kicks_in() {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = notedesk::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    let app = notedesk::api::router(state);

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth",
                None,
                &json!({"username": ADMIN_USERNAME, "password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth",
            None,
            &json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_note_validation() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/notes",
            Some(&token),
            &json!({"ownerId": 1, "title": "  ", "body": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/notes",
            Some(&token),
            &json!({"ownerId": 9999, "title": "Orphan at birth", "body": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
