//! Backend trait consumed by the orchestrator and the submission coordinator.
//!
//! [`HttpBackend`](crate::HttpBackend) talks to the real endpoints; tests
//! implement the trait directly.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use docdrop_protocol::{
    SubmitRequest, SubmitResponse, UploadCompleteRequest, UploadCompleteResponse, UploadResponse,
};

use crate::error::ApiError;

/// Boxed future returned by [`Backend`] methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// File content sent to the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub file_id: String,
    pub name: String,
    pub mime_type: String,
    pub content: Bytes,
}

/// Remote side of the upload flow.
pub trait Backend: Send + Sync {
    /// Uploads one file (single-shot multipart POST).
    fn upload(&self, payload: UploadPayload) -> BackendFuture<'_, UploadResponse>;

    /// Confirms a finished upload.
    fn complete_upload(
        &self,
        request: UploadCompleteRequest,
    ) -> BackendFuture<'_, UploadCompleteResponse>;

    /// Submits the final form.
    fn submit(&self, request: SubmitRequest) -> BackendFuture<'_, SubmitResponse>;
}
