//! Backend implementation over HTTP.
//!
//! Async client using `reqwest`; failure bodies are decoded as
//! `{ "error": "..." }`.

use std::time::Duration;

use docdrop_protocol::{
    ApiErrorBody, SUBMIT_PATH, SubmitRequest, SubmitResponse, UPLOAD_COMPLETE_PATH,
    UPLOAD_FIELD_NAME, UPLOAD_PATH, UploadCompleteRequest, UploadCompleteResponse, UploadResponse,
};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::{Backend, BackendFuture, UploadPayload};
use crate::error::ApiError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the upload and submit endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client rooted at `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_upload(&self, payload: UploadPayload) -> Result<UploadResponse, ApiError> {
        let len = payload.content.len() as u64;
        let part = Part::stream_with_length(payload.content, len)
            .file_name(payload.name.clone())
            .mime_str(&payload.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        debug!(file = %payload.file_id, name = %payload.name, bytes = len, "POST upload");
        let resp = self
            .http
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "POST json");
        let resp = self.http.post(self.url(path)).json(body).send().await?;
        read_json(resp).await
    }
}

/// Decodes a success body, or turns a failure body into [`ApiError::Status`].
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ApiErrorBody>(&body)
            .ok()
            .map(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                let reason = status.canonical_reason().unwrap_or("Request failed");
                reason.to_string()
            });
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

impl Backend for HttpBackend {
    fn upload(&self, payload: UploadPayload) -> BackendFuture<'_, UploadResponse> {
        Box::pin(self.post_upload(payload))
    }

    fn complete_upload(
        &self,
        request: UploadCompleteRequest,
    ) -> BackendFuture<'_, UploadCompleteResponse> {
        Box::pin(async move { self.post_json(UPLOAD_COMPLETE_PATH, &request).await })
    }

    fn submit(&self, request: SubmitRequest) -> BackendFuture<'_, SubmitResponse> {
        Box::pin(async move { self.post_json(SUBMIT_PATH, &request).await })
    }
}
