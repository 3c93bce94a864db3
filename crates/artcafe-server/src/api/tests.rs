use std::sync::Arc;

use artcafe_store::Database;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use super::build_router;
use crate::config::ServerConfig;
use crate::image_store::ImageStore;
use crate::rate_limit::RateLimiter;
use crate::state::{AppState, Db};

const BOUNDARY: &str = "artcafe-test-boundary";

async fn test_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let upload_dir = dir.path().join("uploads");
    let config = ServerConfig {
        upload_dir: upload_dir.clone(),
        max_upload_size: 64 * 1024,
        ..ServerConfig::default()
    };

    let db = Database::open_at(&dir.path().join("artcafe.db")).unwrap();
    let images = ImageStore::new(upload_dir, config.max_upload_size).await.unwrap();
    let state = AppState {
        db: Db::new(db),
        images: Arc::new(images),
        rate_limiter: RateLimiter::new(1000.0, 1000.0),
        config: Arc::new(config),
    };
    (build_router(state), dir)
}

async fn send(
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
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    into_json(app.clone().oneshot(request).await.unwrap()).await
}

async fn send_multipart(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: String,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    into_json(app.clone().oneshot(request).await.unwrap()).await
}

async fn into_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn text_part(name: &str, value: &str) -> String {
    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
}

fn file_part(name: &str, file_name: &str, data: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n{data}\r\n"
    )
}

fn end_part() -> String {
    format!("--{BOUNDARY}--\r\n")
}

/// Register and log in; returns (token, user id).
async fn register(app: &Router, username: &str) -> (String, String) {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret-pass",
            "fullName": format!("{username} artist"),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "usernameOrEmail": username, "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (
        body["token"].as_str().unwrap().to_string(),
        body["id"].as_str().unwrap().to_string(),
    )
}

async fn create_post(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/posts",
        Some(token),
        Some(json!({ "title": title, "content": format!("{title} body") })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn post_json(app: &Router, token: &str, id: &str) -> Value {
    let (status, body) = send(app, Method::GET, &format!("/api/posts/{id}"), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let (app, _dir) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_signup_validation() {
    let (app, _dir) = test_app().await;
    register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "username": "bob", "email": "bob@example.com", "password": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "username": "alice", "email": "other@example.com", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Error: Username is already taken!");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "username": "carol", "email": "alice@example.com", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_and_session_lifecycle() {
    let (app, _dir) = test_app().await;
    let (token, id) = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "usernameOrEmail": "alice@example.com", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Bearer");
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["roles"], json!(["ROLE_USER"]));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "usernameOrEmail": "alice", "password": "wrong-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/api/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["fullName"], "alice artist");

    let (status, _) = send(&app, Method::GET, "/api/users/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/api/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validate_credentials() {
    let (app, _dir) = test_app().await;
    register(&app, "alice").await;

    let check = |login: &'static str, password: &'static str| {
        let app = app.clone();
        async move {
            send(
                &app,
                Method::POST,
                "/api/auth/validate-credentials",
                None,
                Some(json!({ "usernameOrEmail": login, "password": password })),
            )
            .await
        }
    };

    let (status, body) = check("nobody", "secret-pass").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["valid"], false);

    let (status, body) = check("alice", "nope-nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["valid"], false);

    let (status, body) = check("alice", "secret-pass").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_profile_update_and_availability() {
    let (app, _dir) = test_app().await;
    let (token, id) = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/users/profile",
        Some(&token),
        Some(json!({ "bio": "Painter of small things" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "Painter of small things");
    assert_eq!(body["fullName"], "alice artist");

    let (_, body) = send(&app, Method::GET, &format!("/api/users/{id}"), Some(&token), None).await;
    assert_eq!(body["bio"], "Painter of small things");

    let (_, body) = send(&app, Method::GET, "/api/users/check-username?username=alice", None, None).await;
    assert_eq!(body["available"], false);
    let (_, body) = send(&app, Method::GET, "/api/users/check-email?email=new@example.com", None, None).await;
    assert_eq!(body["available"], true);
}

#[tokio::test]
async fn test_change_password() {
    let (app, _dir) = test_app().await;
    let (token, _) = register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/users/profile/change-password",
        Some(&token),
        Some(json!({ "currentPassword": "wrong-pass", "newPassword": "another-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/users/profile/change-password",
        Some(&token),
        Some(json!({ "currentPassword": "secret-pass", "newPassword": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/users/profile/change-password",
        Some(&token),
        Some(json!({ "currentPassword": "secret-pass", "newPassword": "another-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "usernameOrEmail": "alice", "password": "another-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_picture_replaces_previous_file() {
    let (app, dir) = test_app().await;
    let (token, _) = register(&app, "alice").await;

    let upload = |data: &'static str| {
        let app = app.clone();
        let token = token.clone();
        async move {
            let body = file_part("file", "me.png", data) + &end_part();
            send_multipart(&app, Method::POST, "/api/users/profile/picture", &token, body).await
        }
    };

    let (status, first) = upload("first-avatar").await;
    assert_eq!(status, StatusCode::OK);
    let first = first["profilePicture"].as_str().unwrap().to_string();
    assert!(first.starts_with("/images/profile/"));

    let (_, second) = upload("second-avatar").await;
    let second = second["profilePicture"].as_str().unwrap().to_string();

    let on_disk = |public: &str| dir.path().join("uploads").join(public.trim_start_matches("/images/"));
    assert!(!on_disk(&first).exists());
    assert_eq!(std::fs::read(on_disk(&second)).unwrap(), b"second-avatar");
}

#[tokio::test]
async fn test_delete_account_repairs_counters() {
    let (app, _dir) = test_app().await;
    let (alice, _) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;
    let post_id = create_post(&app, &alice, "Still life").await;

    send(&app, Method::POST, &format!("/api/posts/{post_id}/like"), Some(&bob), None).await;
    send(
        &app,
        Method::POST,
        &format!("/api/posts/{post_id}/comments"),
        Some(&bob),
        Some(json!({ "content": "great" })),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, "/api/users/profile", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    let post = post_json(&app, &alice, &post_id).await;
    assert_eq!(post["likeCount"], 0);
    assert_eq!(post["commentCount"], 0);
    let (status, _) = send(&app, Method::GET, "/api/users/profile", Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Posts and likes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_post_crud_and_ownership() {
    let (app, _dir) = test_app().await;
    let (alice, _) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;
    let post_id = create_post(&app, &alice, "Charcoal").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{post_id}"),
        Some(&bob),
        Some(json!({ "title": "hijacked", "content": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{post_id}"),
        Some(&alice),
        Some(json!({ "title": "Charcoal study", "content": "revised", "imageUrl": "/ignored.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Charcoal study");
    assert_eq!(body["imageUrl"], Value::Null);
    assert!(body["updatedAt"].is_string());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/posts/{post_id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/posts/{post_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &format!("/api/posts/{post_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feed_paging_and_by_username() {
    let (app, _dir) = test_app().await;
    let (alice, _) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;
    create_post(&app, &alice, "one").await;
    create_post(&app, &bob, "two").await;
    create_post(&app, &alice, "three").await;

    let (status, body) = send(&app, Method::GET, "/api/posts?page=0&size=2", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 0);
    assert_eq!(body["posts"][0]["title"], "three");
    assert_eq!(body["posts"][0]["user"]["username"], "alice");

    let (_, body) = send(&app, Method::GET, "/api/posts/byUsername/alice", Some(&bob), None).await;
    assert_eq!(body["totalItems"], 2);

    let (status, _) = send(&app, Method::GET, "/api/posts/byUsername/nobody", Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_multipart_post_with_image() {
    let (app, _dir) = test_app().await;
    let (alice, _) = register(&app, "alice").await;

    let body = text_part("title", "Sunset")
        + &text_part("content", "Oil on canvas")
        + &file_part("image", "sunset.png", "PNGDATA")
        + &end_part();
    let (status, post) = send_multipart(&app, Method::POST, "/api/posts", &alice, body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["imageName"], "sunset.png");
    let image_url = post["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/images/posts/"));

    let response = app
        .clone()
        .oneshot(Request::get(&image_url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"PNGDATA");

    let post_id = post["id"].as_str().unwrap();
    send(&app, Method::DELETE, &format!("/api/posts/{post_id}"), Some(&alice), None).await;
    let response = app
        .clone()
        .oneshot(Request::get(&image_url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn image_status(app: &Router, url: &str) -> StatusCode {
    app.clone()
        .oneshot(Request::get(url).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_linked_image_url_is_never_deleted_by_borrower() {
    let (app, _dir) = test_app().await;
    let (alice, _) = register(&app, "alice").await;
    let (mallory, _) = register(&app, "mallory").await;

    let body = text_part("title", "Harbour")
        + &text_part("content", "Watercolour")
        + &file_part("image", "harbour.png", "PNGDATA")
        + &end_part();
    let (status, post) = send_multipart(&app, Method::POST, "/api/posts", &alice, body).await;
    assert_eq!(status, StatusCode::CREATED);
    let image_url = post["imageUrl"].as_str().unwrap().to_string();

    let (status, borrowed) = send(
        &app,
        Method::POST,
        "/api/posts",
        Some(&mallory),
        Some(json!({ "title": "Mine now", "content": "!", "imageUrl": image_url })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let borrowed_id = borrowed["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/posts/{borrowed_id}"),
        Some(&mallory),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(image_status(&app, &image_url).await, StatusCode::OK);

    // Account deletion takes the same path for every post the user owns.
    create_post(&app, &mallory, "filler").await;
    send(
        &app,
        Method::POST,
        "/api/posts",
        Some(&mallory),
        Some(json!({ "title": "Again", "content": "!", "imageUrl": image_url })),
    )
    .await;
    let (status, _) = send(&app, Method::DELETE, "/api/users/profile", Some(&mallory), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(image_status(&app, &image_url).await, StatusCode::OK);

    let post_id = post["id"].as_str().unwrap();
    send(&app, Method::DELETE, &format!("/api/posts/{post_id}"), Some(&alice), None).await;
    assert_eq!(image_status(&app, &image_url).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_toggle_notifies_once() {
    let (app, _dir) = test_app().await;
    let (alice, _) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;
    let post_id = create_post(&app, &alice, "Gouache").await;
    let like_uri = format!("/api/posts/{post_id}/like");

    let (_, body) = send(&app, Method::POST, &like_uri, Some(&bob), None).await;
    assert_eq!(body["liked"], true);
    assert_eq!(body["likeCount"], 1);
    assert_eq!(post_json(&app, &bob, &post_id).await["likedByCurrentUser"], true);

    let (_, body) = send(&app, Method::POST, &like_uri, Some(&bob), None).await;
    assert_eq!(body["liked"], false);
    assert_eq!(body["likeCount"], 0);

    let (_, body) = send(&app, Method::POST, &like_uri, Some(&bob), None).await;
    assert_eq!(body["liked"], true);

    let (_, body) = send(&app, Method::GET, "/api/notifications", Some(&alice), None).await;
    assert_eq!(body["totalItems"], 1);
    let n = &body["notifications"][0];
    assert_eq!(n["type"], "LIKE");
    assert_eq!(n["sender"]["username"], "bob");
    assert_eq!(n["link"], format!("/posts/{post_id}"));
    assert_eq!(n["read"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/posts/{}/like", uuid::Uuid::new_v4()),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_comment_counter_and_ownership() {
    let (app, _dir) = test_app().await;
    let (u1, _) = register(&app, "u1").await;
    let (u2, _) = register(&app, "u2").await;
    let p1 = create_post(&app, &u1, "p1").await;
    let comments_uri = format!("/api/posts/{p1}/comments");

    assert_eq!(post_json(&app, &u1, &p1).await["commentCount"], 0);
    let (status, comment) = send(
        &app,
        Method::POST,
        &comments_uri,
        Some(&u1),
        Some(json!({ "content": "first!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["user"]["username"], "u1");
    assert_eq!(post_json(&app, &u1, &p1).await["commentCount"], 1);

    let comment_uri = format!("{comments_uri}/{}", comment["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &comment_uri, Some(&u2), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(post_json(&app, &u1, &p1).await["commentCount"], 1);

    let (status, body) = send(&app, Method::GET, &comments_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 1);

    let (status, _) = send(&app, Method::DELETE, &comment_uri, Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post_json(&app, &u1, &p1).await["commentCount"], 0);

    let (status, _) = send(&app, Method::DELETE, &comment_uri, Some(&u1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_error_order() {
    let (app, _dir) = test_app().await;
    let (u1, _) = register(&app, "u1").await;
    let (u2, _) = register(&app, "u2").await;
    let p1 = create_post(&app, &u1, "p1").await;
    let p2 = create_post(&app, &u1, "p2").await;

    let (_, comment) = send(
        &app,
        Method::POST,
        &format!("/api/posts/{p1}/comments"),
        Some(&u1),
        Some(json!({ "content": "on p1" })),
    )
    .await;
    let comment_id = comment["id"].as_str().unwrap();

    // Mismatched post is reported before ownership.
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{p2}/comments/{comment_id}"),
        Some(&u2),
        Some(json!({ "content": "edit" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{p1}/comments/{comment_id}"),
        Some(&u2),
        Some(json!({ "content": "edit" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{p1}/comments/{comment_id}"),
        Some(&u1),
        Some(json!({ "content": "edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "edited");
    assert!(body["updatedAt"].is_string());

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/posts/{}/comments", uuid::Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_notification_read_transitions() {
    let (app, _dir) = test_app().await;
    let (alice, _) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;
    for title in ["a", "b", "c"] {
        let post_id = create_post(&app, &alice, title).await;
        send(&app, Method::POST, &format!("/api/posts/{post_id}/like"), Some(&bob), None).await;
    }

    let (_, body) = send(&app, Method::GET, "/api/notifications/unread-count", Some(&alice), None).await;
    assert_eq!(body["count"], 3);

    let (_, list) = send(&app, Method::GET, "/api/notifications", Some(&alice), None).await;
    let first = list["notifications"][0]["id"].as_str().unwrap().to_string();
    let read_uri = format!("/api/notifications/{first}/read");

    let (status, _) = send(&app, Method::PUT, &read_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for _ in 0..2 {
        let (status, body) = send(&app, Method::PUT, &read_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["read"], true);
    }

    let (_, body) = send(&app, Method::PUT, "/api/notifications/read-all", Some(&alice), None).await;
    assert_eq!(body["count"], 2);
    let (_, body) = send(&app, Method::GET, "/api/notifications/unread-count", Some(&alice), None).await;
    assert_eq!(body["count"], 0);

    let (_, body) = send(&app, Method::DELETE, "/api/notifications/clear-read", Some(&alice), None).await;
    assert_eq!(body["count"], 3);
    let (_, body) = send(&app, Method::GET, "/api/notifications", Some(&alice), None).await;
    assert_eq!(body["totalItems"], 0);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/notifications/{}/read", uuid::Uuid::new_v4()),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Learning plans
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_learning_plan_flow() {
    let (app, _dir) = test_app().await;
    let (alice, alice_id) = register(&app, "alice").await;
    let (bob, bob_id) = register(&app, "bob").await;
    let plan_body = json!({
        "title": "Figure drawing",
        "description": "Daily practice",
        "targetCompletionDate": "2025-06-30",
        "topics": [
            { "topicName": "Gesture", "completed": false },
            { "topicName": "Anatomy" }
        ]
    });

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/learning-plans/{bob_id}"),
        Some(&alice),
        Some(plan_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, plan) = send(
        &app,
        Method::POST,
        &format!("/api/learning-plans/{alice_id}"),
        Some(&alice),
        Some(plan_body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plan["createdBy"], alice_id.as_str());
    assert_eq!(plan["targetCompletionDate"], "2025-06-30");
    assert_eq!(plan["topics"][1]["topicName"], "Anatomy");
    let plan_id = plan["id"].as_str().unwrap().to_string();
    let topic_id = plan["topics"][0]["id"].as_str().unwrap().to_string();

    let complete_uri = format!("/api/learning-plans/topics/{topic_id}/complete");
    let (status, _) = send(&app, Method::PUT, &complete_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    for _ in 0..2 {
        let (status, plan) = send(&app, Method::PUT, &complete_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(plan["topics"][0]["completed"], true);
    }

    let (status, plan) = send(
        &app,
        Method::PUT,
        &format!("/api/learning-plans/{plan_id}"),
        Some(&alice),
        Some(json!({ "title": "Figure drawing II" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["title"], "Figure drawing II");
    assert_eq!(plan["topics"].as_array().unwrap().len(), 2);

    let (_, plan) = send(
        &app,
        Method::PUT,
        &format!("/api/learning-plans/{plan_id}"),
        Some(&alice),
        Some(json!({ "title": "Figure drawing II", "topics": [{ "topicName": "Hands" }] })),
    )
    .await;
    assert_eq!(plan["topics"].as_array().unwrap().len(), 1);

    let (_, plans) = send(
        &app,
        Method::GET,
        &format!("/api/learning-plans/{alice_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(plans.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/learning-plans/{plan_id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/learning-plans/{plan_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/learning-plans/single/{plan_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
