mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{TOKEN, body_json, location, set_cookies, spawn_app, spawn_with};
use sangam_portal::{
    InMemoryRepository, MockIdentityService, MockStorageService, identity::MockBehavior,
    models::SessionStatus,
};

fn login_form(body: &str) -> Request<Body> {
    Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn login_json(body: serde_json::Value) -> Request<Body> {
    Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn form_login_sets_cookies_and_returns_to_origin() {
    let app = spawn_app();
    let response = app
        .send(login_form(
            "email=admin%40example.org&password=correct-horse&redirectedFrom=%2Fadmin%2Fnews",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/news");

    let cookies = set_cookies(&response);
    let access = cookies
        .iter()
        .find(|c| c.starts_with("sb-access-token="))
        .expect("access cookie");
    assert!(access.contains(TOKEN));
    assert!(access.contains("HttpOnly"));
    assert!(cookies.iter().any(|c| c.starts_with("sb-refresh-token=")));
}

#[tokio::test]
async fn login_never_redirects_off_site() {
    let app = spawn_app();
    let response = app
        .send(login_form(
            "email=admin%40example.org&password=correct-horse&redirectedFrom=https%3A%2F%2Fevil.test%2Fadmin",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn json_login_with_bad_password_is_401() {
    let app = spawn_app();
    let response = app
        .send(login_json(serde_json::json!({
            "email": "admin@example.org",
            "password": "wrong",
        })))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn form_login_with_bad_password_returns_to_login() {
    let app = spawn_app();
    let response = app
        .send(login_form(
            "email=admin%40example.org&password=wrong&redirectedFrom=%2Fadmin%2Fevents",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/admin/login?error=invalid&redirectedFrom=%2Fadmin%2Fevents"
    );
}

#[tokio::test]
async fn login_while_backend_down_is_503() {
    let app = spawn_with(
        InMemoryRepository::new(),
        MockIdentityService::with_behavior(MockBehavior::Unreachable),
        MockStorageService::new(),
    );
    let response = app
        .send(login_json(serde_json::json!({
            "email": "admin@example.org",
            "password": "correct-horse",
        })))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn logout_revokes_and_clears() {
    let app = spawn_app();
    let response = app
        .send(
            Request::post("/api/auth/logout")
                .header(header::COOKIE, format!("sb-access-token={}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/login");
    assert_eq!(app.identity.signed_out_tokens(), vec![TOKEN.to_string()]);
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("sb-access-token="))
    );

    // The revoked token no longer opens the admin area.
    let after = app.get_signed_in("/admin/dashboard").await;
    assert_eq!(after.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn session_status_reflects_cookies() {
    let app = spawn_app();

    let anonymous: SessionStatus = body_json(app.get("/api/auth/session").await).await;
    assert!(!anonymous.authenticated);
    assert!(anonymous.email.is_none());

    let signed_in: SessionStatus = body_json(app.get_signed_in("/api/auth/session").await).await;
    assert!(signed_in.authenticated);
    assert_eq!(signed_in.email.as_deref(), Some("admin@example.org"));
}

#[tokio::test]
async fn session_check_is_idempotent() {
    let app = spawn_app();
    let first: SessionStatus = body_json(app.get_signed_in("/api/auth/session").await).await;
    let second: SessionStatus = body_json(app.get_signed_in("/api/auth/session").await).await;
    assert_eq!(first.authenticated, second.authenticated);
}

#[tokio::test]
async fn login_round_trip_opens_the_dashboard() {
    let app = spawn_app();
    let login = app
        .send(login_form(
            "email=admin%40example.org&password=correct-horse&redirectedFrom=%2Fadmin%2Fdashboard",
        ))
        .await;
    let target = location(&login);
    let cookie = set_cookies(&login)
        .into_iter()
        .find(|c| c.starts_with("sb-access-token="))
        .and_then(|c| c.split(';').next().map(str::to_string))
        .unwrap();

    let response = app
        .send(
            Request::get(target.as_str())
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
