#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use taskboard::auth::{BcryptHasher, Sha256Hasher, TokenService};
use taskboard::clock::ManualClock;
use taskboard::routes;
use taskboard::store::MemoryStore;
use taskboard::upload::LocalBlobStore;
use taskboard::{AppState, Dependencies};

/// An application backed by the in-memory store and a hand-driven clock.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub state: web::Data<AppState>,
    pub upload_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_upload_limit(1024)
    }

    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap(),
        ));
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let tokens = Arc::new(TokenService::new(
            "test-access-secret",
            "test-refresh-secret",
            clock.clone(),
        ));

        let state = web::Data::new(AppState::new(Dependencies {
            credentials: store.clone(),
            tasks: store.clone(),
            categories: store.clone(),
            tokens,
            // Lowest bcrypt cost keeps the suite fast.
            password_hasher: Arc::new(BcryptHasher::new(4)),
            refresh_hasher: Arc::new(Sha256Hasher),
            blobs: Arc::new(LocalBlobStore::new(upload_dir.path(), clock.clone())),
            clock: clock.clone(),
            max_upload_bytes,
        }));

        Self {
            store,
            clock,
            state,
            upload_dir,
        }
    }

    /// Moves time forward so consecutive records get distinct timestamps.
    pub fn tick(&self) {
        self.clock.advance(Duration::seconds(1));
    }
}

pub async fn init_app(
    harness: &Harness,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(harness.state.clone())
            .app_data(harness.state.token_data())
            .configure(routes::config),
    )
    .await
}

/// Calls the app and returns the status and JSON body, whether the failure came
/// from a handler or from middleware.
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, bytes) = match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            (status, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let bytes = actix_web::body::to_bytes(resp.into_body())
                .await
                .unwrap_or_default();
            (status, bytes)
        }
    };
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub struct TestUser {
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn register_and_login<S, B>(app: &S, username: &str) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "Password123!"
        }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": username, "password": "Password123!" }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "login failed: {}", body);

    TestUser {
        username: username.to_string(),
        access_token: body["access_token"].as_str().unwrap().to_string(),
        refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
    }
}

pub async fn create_task<S, B>(app: &S, user: &TestUser, payload: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(&user.access_token))
        .set_json(payload)
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
    body
}

pub async fn create_category<S, B>(app: &S, user: &TestUser, name: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/categories")
        .insert_header(bearer(&user.access_token))
        .set_json(json!({ "name": name }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "create category failed: {}", body);
    body
}
