//! Route handlers.
//!
//! Request bodies are inspected loosely (as the browser client would send
//! them) and every rejection is a `{ "error": ... }` body.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use docdrop_protocol::{
    ApiErrorBody, PDF_MIME_TYPE, SUBMIT_PATH, SubmitFile, SubmitResponse, SubmittedData,
    UPLOAD_COMPLETE_PATH, UPLOAD_FIELD_NAME, UPLOAD_PATH, UploadCompleteResponse, UploadResponse,
    storage_url,
};
use docdrop_transfer::format_file_size;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{LatencyRange, MockConfig};

/// Failures injected into uploads, picked uniformly.
pub const UPLOAD_FAILURES: &[(u16, &str)] = &[
    (500, "Internal server error during upload"),
    (503, "Service temporarily unavailable"),
    (507, "Insufficient storage space"),
    (408, "Request timeout"),
    (413, "Payload too large"),
];

/// Failure injected into submissions.
pub const SUBMIT_FAILURE: (u16, &str) = (500, "Simulated server error for testing");

/// Headroom above the file size limit for multipart framing.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

struct AppState {
    config: MockConfig,
    rng: Mutex<StdRng>,
}

impl AppState {
    /// Draws a failure with probability `rate`. Rates that are not a
    /// positive number never fail; rates above one always do.
    fn roll(&self, rate: f64) -> bool {
        if rate.is_nan() || rate <= 0.0 {
            return false;
        }
        self.with_rng(|rng| rng.random_bool(rate.min(1.0)))
    }

    fn latency(&self, range: LatencyRange) -> Duration {
        self.with_rng(|rng| range.sample(rng))
    }

    fn pick_upload_failure(&self) -> (u16, &'static str) {
        let i = self.with_rng(|rng| rng.random_range(0..UPLOAD_FAILURES.len()));
        UPLOAD_FAILURES[i]
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}

/// Error response carrying an [`ApiErrorBody`].
#[derive(Debug)]
struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(ApiErrorBody::new(self.message))).into_response()
    }
}

impl From<JsonRejection> for ApiFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Builds the mock API router.
pub fn router(config: MockConfig) -> Router {
    let body_limit = usize::try_from(config.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_SLACK);
    let state = Arc::new(AppState {
        config,
        rng: Mutex::new(StdRng::from_os_rng()),
    });

    Router::new()
        .route(UPLOAD_PATH, post(upload))
        .route(UPLOAD_COMPLETE_PATH, post(complete))
        .route(SUBMIT_PATH, post(submit))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

struct ReceivedFile {
    name: String,
    mime_type: String,
    size: u64,
}

async fn read_file_field(mut multipart: Multipart) -> Result<Option<ReceivedFile>, ApiFailure> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::new(e.status().as_u16(), e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiFailure::new(e.status().as_u16(), e.body_text()))?;
        return Ok(Some(ReceivedFile {
            name,
            mime_type,
            size: data.len() as u64,
        }));
    }
    Ok(None)
}

async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiFailure> {
    let Some(file) = read_file_field(multipart).await? else {
        return Err(ApiFailure::bad_request("No file provided"));
    };
    if file.mime_type != PDF_MIME_TYPE {
        return Err(ApiFailure::bad_request("Only PDF files are allowed"));
    }
    if file.size > state.config.max_file_size {
        let message = too_large_message(state.config.max_file_size);
        return Err(ApiFailure::bad_request(message));
    }

    tokio::time::sleep(state.latency(state.config.upload_latency)).await;

    if state.roll(state.config.upload_failure_rate) {
        let (status, message) = state.pick_upload_failure();
        warn!(name = %file.name, status, "simulated upload error: {message}");
        return Err(ApiFailure::new(status, message));
    }

    let id = uuid::Uuid::new_v4().to_string();
    info!(name = %file.name, bytes = file.size, %id, "file uploaded");
    Ok(Json(UploadResponse {
        url: storage_url(&state.config.storage_base_url, &id, &file.name),
        id,
        name: file.name,
        size: file.size,
        mime_type: file.mime_type,
    }))
}

/// `File too large. Maximum size is 5MB` for the configured limit.
fn too_large_message(max_file_size: u64) -> String {
    let limit = format_file_size(max_file_size).replace(' ', "");
    format!("File too large. Maximum size is {limit}")
}

/// A JSON value that counts as "present" in a browser-style check.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(_) => true,
    }
}

async fn complete(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UploadCompleteResponse>, ApiFailure> {
    let Json(body) = body?;
    let file_id = body.get("fileId");
    if !truthy(file_id) {
        return Err(ApiFailure::bad_request("File ID is required"));
    }
    let file_id = match file_id {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    tokio::time::sleep(Duration::from_millis(state.config.complete_delay_ms)).await;

    info!(
        file = %file_id,
        chunks = ?body.get("chunkCount"),
        bytes = ?body.get("totalSize"),
        "upload completed"
    );
    Ok(Json(UploadCompleteResponse {
        ok: true,
        file_id,
        status: "completed".into(),
        message: "File upload completed successfully".into(),
    }))
}

fn parse_files(value: Option<&Value>) -> Result<Vec<SubmitFile>, ApiFailure> {
    let Some(Value::Array(entries)) = value else {
        return Err(ApiFailure::bad_request("At least one file is required"));
    };
    if entries.is_empty() {
        return Err(ApiFailure::bad_request("At least one file is required"));
    }

    let invalid = || ApiFailure::bad_request("Invalid file structure");
    entries
        .iter()
        .map(|entry| {
            let complete = ["id", "name", "size", "type", "url"]
                .iter()
                .all(|key| truthy(entry.get(key)));
            if !complete {
                return Err(invalid());
            }
            serde_json::from_value::<SubmitFile>(entry.clone()).map_err(|_| invalid())
        })
        .collect()
}

async fn submit(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiFailure> {
    let Json(body) = body?;
    let text = |key: &str| match body.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };
    let (Some(title), Some(description)) = (text("title"), text("description")) else {
        return Err(ApiFailure::bad_request(
            "Title and description are required",
        ));
    };
    let files = parse_files(body.get("files"))?;

    tokio::time::sleep(state.latency(state.config.submit_latency)).await;

    let submission_id = uuid::Uuid::new_v4().to_string();
    let total_size: u64 = files.iter().map(|f| f.size).sum();
    info!(
        submission = %submission_id,
        %title,
        files = files.len(),
        total_size,
        "form submitted"
    );

    if state.roll(state.config.submit_failure_rate) {
        let (status, message) = SUBMIT_FAILURE;
        warn!(submission = %submission_id, "simulated submit error");
        return Err(ApiFailure::new(status, message));
    }

    Ok(Json(SubmitResponse {
        ok: true,
        submission_id,
        message: "Form submitted successfully".into(),
        data: SubmittedData {
            title,
            description,
            files,
        },
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
