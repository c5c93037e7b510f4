//! Final submission: precondition checks, payload assembly and one call to
//! the submit endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use docdrop_notices::Notifier;
use docdrop_protocol::{
    DEFAULT_STORAGE_BASE_URL, SubmitFile, SubmitRequest, SubmitResponse, storage_url,
};
use docdrop_transfer::FileDescriptor;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::error::{ApiError, SubmitError};
use crate::store::FileStore;

/// User-entered form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitForm {
    pub title: String,
    pub description: String,
}

impl SubmitForm {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Clears the busy flag when the submission ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sends the form once every file is uploaded.
pub struct SubmissionCoordinator {
    backend: Arc<dyn Backend>,
    store: FileStore,
    notifier: Notifier,
    storage_base_url: String,
    busy: AtomicBool,
}

impl SubmissionCoordinator {
    pub fn new(backend: Arc<dyn Backend>, store: FileStore, notifier: Notifier) -> Self {
        Self {
            backend,
            store,
            notifier,
            storage_base_url: DEFAULT_STORAGE_BASE_URL.to_string(),
            busy: AtomicBool::new(false),
        }
    }

    /// Overrides the base of the per-file location reference.
    pub fn with_storage_base_url(mut self, base: impl Into<String>) -> Self {
        self.storage_base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns `true` while a submission is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Location reference of an uploaded file.
    pub fn file_url(&self, file: &FileDescriptor) -> String {
        storage_url(&self.storage_base_url, &file.id, &file.name)
    }

    /// Builds the submit payload from the current collection.
    ///
    /// Fails if any file is not `done`, or if there are no files.
    pub fn build_request(&self, form: &SubmitForm) -> Result<SubmitRequest, SubmitError> {
        let files = self.store.snapshot();
        let pending = files.iter().filter(|f| !f.is_done()).count();
        if pending > 0 {
            return Err(SubmitError::Pending { pending });
        }
        if files.is_empty() {
            return Err(SubmitError::Empty);
        }

        Ok(SubmitRequest {
            title: form.title.clone(),
            description: form.description.clone(),
            files: files
                .iter()
                .map(|f| SubmitFile {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    size: f.size,
                    mime_type: f.mime_type.clone(),
                    url: self.file_url(f),
                })
                .collect(),
        })
    }

    /// Submits the form.
    ///
    /// Precondition failures raise a warning notice and never reach the
    /// network. On success the collection is cleared; on failure it is left
    /// as is so the user can submit again.
    pub async fn submit(&self, form: &SubmitForm) -> Result<SubmitResponse, SubmitError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let request = match self.build_request(form) {
            Ok(request) => request,
            Err(e) => {
                self.warn_precondition(&e);
                return Err(e);
            }
        };

        let count = request.files.len();
        info!(files = count, "submitting form");
        match self.backend.submit(request).await {
            Ok(response) => {
                info!(submission = %response.submission_id, "submission accepted");
                self.notifier.success(
                    "Form submitted",
                    format!(
                        "{count} file(s) submitted successfully. Reference: {}",
                        response.submission_id
                    ),
                );
                self.store.clear();
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "submission failed");
                self.notifier.error("Submission failed", failure_message(&e));
                Err(e.into())
            }
        }
    }

    fn warn_precondition(&self, err: &SubmitError) {
        let (title, message) = match err {
            SubmitError::Pending { pending } => (
                "Pending files",
                format!("{pending} file(s) still need to finish uploading before submitting"),
            ),
            SubmitError::Empty => (
                "No files",
                "Add at least one PDF file before submitting".to_string(),
            ),
            _ => return,
        };
        self.notifier.warning(title, message);
    }
}

fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Status { status, message } => format!("Error {status}: {message}"),
        other => other.to_string(),
    }
}
