#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use sangam_portal::{
    AppConfig, AppState, InMemoryRepository, MockIdentityService, MockStorageService,
    create_router,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

pub const TOKEN: &str = MockIdentityService::VALID_TOKEN;
pub const BOUNDARY: &str = "X-SANGAM-TEST-BOUNDARY";

/// Router plus handles on every collaborator behind it.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub storage: MockStorageService,
    pub identity: Arc<MockIdentityService>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        identity_timeout: Duration::from_millis(200),
        ..AppConfig::default()
    }
}

pub fn state_with(
    repo: Arc<InMemoryRepository>,
    identity: Arc<MockIdentityService>,
    storage: MockStorageService,
) -> AppState {
    AppState::new(repo, Arc::new(storage), identity, test_config())
}

pub fn spawn_with(
    repo: InMemoryRepository,
    identity: MockIdentityService,
    storage: MockStorageService,
) -> TestApp {
    let repo = Arc::new(repo);
    let identity = Arc::new(identity);
    let state = state_with(repo.clone(), identity.clone(), storage.clone());
    TestApp {
        router: create_router(state),
        repo,
        storage,
        identity,
    }
}

pub fn spawn_app() -> TestApp {
    spawn_with(
        InMemoryRepository::new(),
        MockIdentityService::new(),
        MockStorageService::new(),
    )
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_signed_in(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header(header::COOKIE, format!("sb-access-token={}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// A `multipart/form-data` body with text fields and an optional `image` part.
pub fn multipart(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// An authenticated multipart request to the admin API.
pub fn admin_form(
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> Request<Body> {
    let (content_type, body) = multipart(fields, image);
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}
