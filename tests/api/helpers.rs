//! In-process stand-in for the DeepL document API.
//!
//! Behaviour is scripted by the uploaded file name:
//! * `reject*` — upload answers 400
//! * `broken*` — status reports `error` with a message
//! * `stuck*`  — status never leaves the pending state
//!
//! Everything else goes through `pending_polls` pending answers before `done`.
//! The result body is the original content prefixed with `[LANG] `.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use deepl_pdf_translator::TranslatorConfig;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "test-key";

// Ensures that the `tracing` stack is only initialized once
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter("deepl_pdf_translator=debug")
            .with_test_writer()
            .init();
    }
});

#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Number of pending answers before `done`
    pub pending_polls: usize,
    /// Status string used while a document is pending
    pub pending_status: &'static str,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            pending_polls: 0,
            pending_status: "in-progress",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockDocument {
    pub key: String,
    pub file_name: String,
    pub target_lang: String,
    pub source_lang: Option<String>,
    pub content: Vec<u8>,
    pub status_checks: usize,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub options: MockOptions,
    pub next_id: usize,
    pub documents: HashMap<String, MockDocument>,
    /// File names in upload order, rejected ones included
    pub uploads: Vec<String>,
    /// Document ids in download order
    pub downloads: Vec<String>,
}

impl MockState {
    pub fn total_status_checks(&self) -> usize {
        self.documents.values().map(|d| d.status_checks).sum()
    }

    pub fn document_for(&self, file_name: &str) -> Option<&MockDocument> {
        self.documents.values().find(|d| d.file_name == file_name)
    }
}

type SharedState = Arc<Mutex<MockState>>;

pub struct TestApp {
    pub address: String,
    pub state: SharedState,
}

impl TestApp {
    /// Translator settings pointing at this mock with fast polling
    pub fn config(&self) -> TranslatorConfig {
        let mut config = TranslatorConfig::with_api_key(API_KEY);
        config.api_url = Some(self.address.clone());
        config.poll_interval_ms = 10;
        config.max_poll_interval_ms = 10;
        config.max_wait_secs = 5;
        config
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

/// Launches the mock service as a background task on an ephemeral port
pub async fn spawn_app() -> TestApp {
    spawn_app_with(MockOptions::default()).await
}

pub async fn spawn_app_with(options: MockOptions) -> TestApp {
    Lazy::force(&TRACING);

    let state: SharedState = Arc::new(Mutex::new(MockState {
        options,
        ..Default::default()
    }));

    let app = Router::new()
        .route("/v2/document", post(upload))
        .route("/v2/document/:id", get(status))
        .route("/v2/document/:id/result", get(result))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server failed");
    });

    TestApp {
        address: format!("http://127.0.0.1:{}/v2", port),
        state,
    }
}

/// Write a fake PDF under `root`, creating parent directories
pub fn write_pdf(root: &FsPath, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("DeepL-Auth-Key {}", API_KEY);
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str())
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

#[derive(Deserialize)]
struct KeyQuery {
    document_key: String,
}

async fn upload(
    State(state): State<SharedState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::FORBIDDEN, "Wrong auth key");
    }

    let mut file_name = String::new();
    let mut content = Vec::new();
    let mut target_lang = String::new();
    let mut source_lang = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                file_name = field.file_name().map(str::to_owned).unwrap_or_default();
                content = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            Some("target_lang") => target_lang = field.text().await.unwrap_or_default(),
            Some("source_lang") => source_lang = field.text().await.ok(),
            _ => {}
        }
    }

    let mut state = state.lock().unwrap();
    state.uploads.push(file_name.clone());

    if file_name.starts_with("reject") {
        return error(StatusCode::BAD_REQUEST, "Bad request. Reason: unsupported document");
    }
    if target_lang.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Parameter 'target_lang' not specified");
    }

    state.next_id += 1;
    let id = format!("DOC{:04}", state.next_id);
    let key = format!("KEY{:04}", state.next_id);
    state.documents.insert(
        id.clone(),
        MockDocument {
            key: key.clone(),
            file_name,
            target_lang,
            source_lang,
            content,
            status_checks: 0,
        },
    );

    Json(json!({ "document_id": id, "document_key": key })).into_response()
}

async fn status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<KeyQuery>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::FORBIDDEN, "Wrong auth key");
    }

    let mut state = state.lock().unwrap();
    let options = state.options.clone();
    let Some(doc) = state.documents.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Document not found");
    };
    if doc.key != query.document_key {
        return error(StatusCode::NOT_FOUND, "Document not found");
    }

    doc.status_checks += 1;

    if doc.file_name.starts_with("broken") {
        return Json(json!({
            "document_id": id,
            "status": "error",
            "message": "Document is corrupt"
        }))
        .into_response();
    }

    if doc.file_name.starts_with("stuck") || doc.status_checks <= options.pending_polls {
        return Json(json!({
            "document_id": id,
            "status": options.pending_status,
            "seconds_remaining": 3
        }))
        .into_response();
    }

    Json(json!({
        "document_id": id,
        "status": "done",
        "billed_characters": doc.content.len()
    }))
    .into_response()
}

async fn result(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<KeyQuery>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::FORBIDDEN, "Wrong auth key");
    }

    let mut state = state.lock().unwrap();
    let Some(doc) = state.documents.get(&id).cloned() else {
        return error(StatusCode::NOT_FOUND, "Document not found");
    };
    if doc.key != query.document_key {
        return error(StatusCode::NOT_FOUND, "Document not found");
    }
    state.downloads.push(id);

    let mut body = format!("[{}] ", doc.target_lang).into_bytes();
    body.extend_from_slice(&doc.content);
    (StatusCode::OK, body).into_response()
}
