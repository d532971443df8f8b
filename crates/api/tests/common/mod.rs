#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use reshub_api::auth::jwt::{generate_access_token, JwtConfig};
use reshub_api::config::ServerConfig;
use reshub_api::router::build_app_router;
use reshub_api::state::AppState;
use reshub_api::storage::{
    BlobUploader, StorageError, UploadOptions, UploadRequest, UploadedBlob,
};
use reshub_core::types::DbId;
use reshub_core::upload::MAX_UPLOAD_BYTES;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_UPLOAD_FOLDER: &str = "test-resources";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_upload_bytes: MAX_UPLOAD_BYTES,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

// ---------------------------------------------------------------------------
// Uploader stub
// ---------------------------------------------------------------------------

/// Records uploads and answers with a predictable URL, or fails every call.
#[derive(Default)]
pub struct StubUploader {
    pub uploads: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl StubUploader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(folder, file_name)` of every upload received.
    pub fn recorded(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobUploader for StubUploader {
    async fn upload(
        &self,
        request: UploadRequest,
        folder: &str,
        _options: UploadOptions,
    ) -> Result<UploadedBlob, StorageError> {
        self.uploads
            .lock()
            .unwrap()
            .push((folder.to_string(), request.file_name.clone()));
        if self.fail {
            return Err(StorageError::MissingUrl);
        }
        Ok(UploadedBlob {
            secure_url: format!("https://files.example.com/{}", request.file_name),
            resource_type: Some("raw".to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Build the full application router over `pool` with a recording uploader.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config(), Arc::new(StubUploader::default()))
}

pub fn build_test_app_with(
    pool: PgPool,
    config: ServerConfig,
    uploader: Arc<StubUploader>,
) -> Router {
    let state = AppState::new(
        pool,
        config.clone(),
        uploader,
        TEST_UPLOAD_FOLDER.to_string(),
    );
    build_app_router(state, &config)
}

/// A valid bearer token for `user_id` signed with the test secret.
pub fn token_for(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn authorized(method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
}

pub async fn get(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = authorized(Method::GET, uri, token)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_anonymous(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = authorized(Method::DELETE, uri, token)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::POST, uri, token, body).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::PUT, uri, token, body).await
}

async fn json_request(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = authorized(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, request).await
}

pub async fn send_form(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    form: Form,
) -> Response<Body> {
    let (content_type, body) = form.finish();
    let request = authorized(method, uri, token)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "reshub-test-boundary";

/// Minimal `multipart/form-data` encoder.
#[derive(Default)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), self.body)
    }
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub struct Seed {
    pub admin: DbId,
    pub alice: DbId,
    pub bob: DbId,
    pub category: DbId,
    pub go: DbId,
    pub rust: DbId,
    pub sql: DbId,
    pub alice_collection: DbId,
    pub bob_collection: DbId,
}

impl Seed {
    pub fn admin_token(&self) -> String {
        token_for(self.admin, "admin")
    }

    pub fn alice_token(&self) -> String {
        token_for(self.alice, "user")
    }

    pub fn bob_token(&self) -> String {
        token_for(self.bob, "user")
    }

    /// A complete create form for Alice filing into her own collection.
    pub fn create_form(&self) -> Form {
        Form::new()
            .text("title", "Intro to Rust")
            .text("description", "Workshop slides")
            .text("category_id", &self.category.to_string())
            .text("plan", "free")
            .text("collection_id", &self.alice_collection.to_string())
            .text("tag_id", &self.rust.to_string())
            .text("additional_tag_ids", &format!("[{}, {}]", self.go, self.rust))
            .file("intro-rust.pdf", "application/pdf", b"%PDF-1.4 test")
    }
}

async fn insert_user(pool: &PgPool, name: &str, role: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING id")
        .bind(name)
        .bind(format!("{}@example.com", name.to_lowercase()))
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn insert_tag(pool: &PgPool, name: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO tags (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn insert_collection(pool: &PgPool, name: &str, owner: DbId) -> DbId {
    sqlx::query_scalar("INSERT INTO collections (name, user_id) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(owner)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed(pool: &PgPool) -> Seed {
    let admin = insert_user(pool, "Admin", "admin").await;
    let alice = insert_user(pool, "Alice", "user").await;
    let bob = insert_user(pool, "Bob", "user").await;
    let category: DbId =
        sqlx::query_scalar("INSERT INTO categories (name) VALUES ('Programming') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

    Seed {
        admin,
        alice,
        bob,
        category,
        go: insert_tag(pool, "go").await,
        rust: insert_tag(pool, "rust").await,
        sql: insert_tag(pool, "sql").await,
        alice_collection: insert_collection(pool, "Alice reading list", alice).await,
        bob_collection: insert_collection(pool, "Bob picks", bob).await,
    }
}

/// Create a resource as Alice through the HTTP surface and return its id.
pub async fn create_as_alice(app: &Router, seed: &Seed) -> DbId {
    let response = send_form(
        app,
        Method::POST,
        "/api/v1/resources",
        &seed.alice_token(),
        seed.create_form(),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
