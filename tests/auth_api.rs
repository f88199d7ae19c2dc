//! HTTP-level tests for the authentication endpoints, run against an
//! in-memory SQLite database.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    Router,
};
use schoolhub::{
    build_app,
    config::{AppConfig, JwtConfig},
    db, AppState,
};
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

async fn test_app() -> (Router, AppState) {
    let db = db::connect_memory().await.expect("in-memory db");
    let config = AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".into()],
        jwt: JwtConfig::new("integration-secret", "1h").unwrap(),
    };
    let state = AppState::from_parts(db, config);
    (build_app(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn count(state: &AppState, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(&state.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn teacher_registers_then_logs_in() {
    let (app, state) = test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            json!({"role": "teacher", "name": "A", "email": "a@x.com", "password": "p", "department": "Math"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Teacher user registered successfully!");
    assert!(body["teacherId"].is_i64());
    let user_id = body["userId"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        json_request("POST", "/auth/login", json!({"email": "a@x.com", "password": "p"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "teacher");
    assert_eq!(body["id"], user_id);
    assert_eq!(body["email"], "a@x.com");

    let token = body["accessToken"].as_str().unwrap();
    assert_eq!(state.jwt.verify(token).unwrap().sub, user_id);
}

#[tokio::test]
async fn student_registration_response() {
    let (app, state) = test_app().await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            json!({"role": "student", "name": "S", "email": "s@x.com", "password": "pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Student user registered successfully!");
    assert!(body["studentId"].is_i64());
    assert!(body.get("teacherId").is_none());
    assert_eq!(count(&state, "students").await, 1);
    assert_eq!(count(&state, "users").await, 1);
}

#[tokio::test]
async fn registration_validation_errors_are_400_with_message() {
    let (app, state) = test_app().await;
    let cases = [
        json!({"email": "a@x.com", "password": "p", "role": "student"}),
        json!({"name": "A", "email": "a@x.com", "password": "p", "role": "admin"}),
        json!({"name": "A", "email": "a@x.com", "password": "p", "role": "teacher"}),
        json!({"name": "A", "email": "a@x.com", "password": "", "role": "student"}),
    ];
    for case in cases {
        let (status, body) = send(&app, json_request("POST", "/auth/register", case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case {}", case);
        assert!(body["message"].is_string(), "case {}", case);
    }
    assert_eq!(count(&state, "users").await, 0);
}

#[tokio::test]
async fn malformed_json_is_a_json_400() {
    let (app, _) = test_app().await;
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (app, state) = test_app().await;
    let payload = json!({"role": "student", "name": "S", "email": "dup@x.com", "password": "pw"});

    let (status, _) = send(&app, json_request("POST", "/auth/register", payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, json_request("POST", "/auth/register", payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User with this email already exists.");
    assert_eq!(count(&state, "users").await, 1);
    assert_eq!(count(&state, "students").await, 1);
}

#[tokio::test]
async fn storage_failure_is_500_and_rolled_back() {
    let (app, state) = test_app().await;
    sqlx::query(
        "CREATE TRIGGER reject_users BEFORE INSERT ON users \
         BEGIN SELECT RAISE(ABORT, 'users table is read-only'); END;",
    )
    .execute(&state.db)
    .await
    .unwrap();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            json!({"role": "teacher", "name": "T", "email": "t@x.com", "password": "p", "department": "Art"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("read-only"));
    assert_eq!(count(&state, "teachers").await, 0);
    assert_eq!(count(&state, "users").await, 0);
}

#[tokio::test]
async fn login_error_statuses() {
    let (app, _) = test_app().await;
    send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            json!({"role": "student", "name": "S", "email": "s@x.com", "password": "secret"}),
        ),
    )
    .await;

    let (status, _) = send(&app, json_request("POST", "/auth/login", json!({"email": "s@x.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request("POST", "/auth/login", json!({"email": "nobody@x.com", "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found.");

    let (status, body) = send(
        &app,
        json_request("POST", "/auth/login", json!({"email": "s@x.com", "password": "secreT"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid Password!");
}

#[tokio::test]
async fn users_requires_a_token() {
    let (app, _) = test_app().await;
    let (status, body) = send(&app, get("/auth/users", None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "No token provided!");

    let (status, body) = send(&app, get("/auth/users", Some(""))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "No token provided!");
}

#[tokio::test]
async fn unreadable_authorization_header_is_unauthorized() {
    let (app, _) = test_app().await;
    let req = Request::builder()
        .uri("/auth/users")
        .header(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xffabc").unwrap(),
        )
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized! Invalid or expired token.");
}

#[tokio::test]
async fn users_rejects_expired_and_forged_tokens() {
    let (app, state) = test_app().await;

    let expired = state
        .jwt
        .sign_at(1, OffsetDateTime::now_utc() - Duration::hours(2))
        .unwrap();
    let (status, body) = send(&app, get("/auth/users", Some(&format!("Bearer {}", expired)))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized! Invalid or expired token.");

    let (status, _) = send(&app, get("/auth/users", Some("Bearer not.a.token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn users_lists_accounts_with_or_without_bearer_prefix() {
    let (app, _) = test_app().await;
    send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            json!({"role": "student", "name": "S", "email": "s@x.com", "password": "pw"}),
        ),
    )
    .await;
    let (_, login) = send(
        &app,
        json_request("POST", "/auth/login", json!({"email": "s@x.com", "password": "pw"})),
    )
    .await;
    let token = login["accessToken"].as_str().unwrap().to_string();

    for value in [format!("Bearer {}", token), token.clone()] {
        let (status, body) = send(&app, get("/auth/users", Some(&value))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"id": login["id"], "email": "s@x.com"}]));
    }
}

#[tokio::test]
async fn root_and_health() {
    let (app, _) = test_app().await;
    let res = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Welcome to School API!");

    let res = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let (app, _) = test_app().await;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/auth/login")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}
