//! Upload orchestrator: drives each file through
//! `idle → uploading → done | error | canceled`.
//!
//! A run collects every `idle` file and executes one upload task per file
//! through [`run_bounded`] with `pool_size` tasks in flight. Each task owns
//! a [`CancellationToken`] registered under the file id for as long as the
//! upload is active.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use docdrop_protocol::UploadCompleteRequest;
use docdrop_transfer::{FileDescriptor, FileStatus, ProgressSteps, TaskError, run_bounded};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{Backend, UploadPayload};
use crate::error::UploadFailure;
use crate::settings::UploadSettings;
use crate::store::{FileStore, Snapshot};

/// How a single upload task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Done,
    Failed,
    Canceled,
    /// The file was gone or no longer idle when its task started.
    Skipped,
}

/// Counts for one [`UploadOrchestrator::start_upload`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub done: usize,
    pub failed: usize,
    pub canceled: usize,
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Done => self.done += 1,
            FileOutcome::Failed => self.failed += 1,
            FileOutcome::Canceled => self.canceled += 1,
            FileOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.done + self.failed + self.canceled + self.skipped
    }
}

/// Clears the run flag when a run ends, even by panic.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Coordinates uploads of the files in a [`FileStore`].
pub struct UploadOrchestrator {
    backend: Arc<dyn Backend>,
    store: FileStore,
    settings: UploadSettings,
    cancels: Mutex<HashMap<String, CancellationToken>>,
    running: AtomicBool,
}

impl UploadOrchestrator {
    pub fn new(backend: Arc<dyn Backend>, store: FileStore, settings: UploadSettings) -> Self {
        Self {
            backend,
            store,
            settings,
            cancels: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Receiver of collection snapshots, for rendering.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.store.subscribe()
    }

    /// Returns `true` while a run is in progress.
    pub fn is_uploading(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns `true` if a run would start: no run active and at least one idle file.
    pub fn can_start(&self) -> bool {
        !self.is_uploading() && self.store.snapshot().iter().any(FileDescriptor::is_idle)
    }

    /// Returns `true` if `id` currently has a registered cancellation handle.
    pub fn is_active(&self, id: &str) -> bool {
        self.lock_cancels().contains_key(id)
    }

    fn lock_cancels(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.cancels.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Uploads every `idle` file with bounded concurrency.
    ///
    /// Returns `None` without doing anything if a run is already active or
    /// no file is idle.
    pub async fn start_upload(&self) -> Option<RunSummary> {
        let pending: Vec<String> = self
            .store
            .snapshot()
            .iter()
            .filter(|f| f.is_idle())
            .map(|f| f.id.clone())
            .collect();
        if pending.is_empty() {
            return None;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("upload run already active");
            return None;
        }
        let _guard = RunGuard(&self.running);

        info!(
            files = pending.len(),
            pool = self.settings.pool_size,
            "upload run started"
        );

        let tasks: Vec<_> = pending
            .iter()
            .cloned()
            .map(|id| move || async move { Ok::<_, Infallible>(self.upload_file(&id).await) })
            .collect();
        let results = run_bounded(self.settings.pool_size, tasks).await;

        let mut summary = RunSummary::default();
        for (id, result) in pending.iter().zip(results) {
            match result {
                Ok(outcome) => summary.record(outcome),
                Err(TaskError::Panicked(msg)) => {
                    warn!(file = %id, panic = %msg, "upload task panicked");
                    self.lock_cancels().remove(id.as_str());
                    self.store
                        .update(id, |f| f.fail(vec!["Upload failed unexpectedly".into()]));
                    summary.record(FileOutcome::Failed);
                }
                Err(TaskError::Failed(never)) => match never {},
            }
        }

        info!(
            total = summary.total(),
            done = summary.done,
            failed = summary.failed,
            canceled = summary.canceled,
            "upload run finished"
        );
        Some(summary)
    }

    /// Runs the upload state machine for one file.
    ///
    /// Only an `idle` file is uploaded. Every failure is turned into a state
    /// transition; cancellation observed at any point before the terminal
    /// transition wins over both success and failure.
    pub async fn upload_file(&self, id: &str) -> FileOutcome {
        let Some(file) = self.store.get(id) else {
            return FileOutcome::Skipped;
        };
        if !file.is_idle() {
            return FileOutcome::Skipped;
        }

        let token = CancellationToken::new();
        self.lock_cancels().insert(id.to_string(), token.clone());
        self.store.update(id, FileDescriptor::begin_upload);
        debug!(file = %id, name = %file.name, "upload started");

        let result = self.drive(&file, &token).await;
        self.lock_cancels().remove(id);

        if token.is_cancelled() {
            self.store.update(id, FileDescriptor::cancel);
            info!(file = %id, name = %file.name, "upload canceled");
            return FileOutcome::Canceled;
        }

        match result {
            Ok(()) => {
                self.store.update(id, FileDescriptor::complete);
                debug!(file = %id, name = %file.name, "upload done");
                FileOutcome::Done
            }
            Err(UploadFailure::Canceled) => {
                self.store.update(id, FileDescriptor::cancel);
                FileOutcome::Canceled
            }
            Err(e) => {
                let reason = e.reason();
                warn!(
                    file = %id,
                    name = %file.name,
                    error = %reason,
                    kind = ?e.kind(),
                    transient = e.is_transient(),
                    "upload failed"
                );
                self.store.update(id, |f| f.fail(vec![reason]));
                FileOutcome::Failed
            }
        }
    }

    /// Simulated progress, then the network call(s).
    async fn drive(
        &self,
        file: &FileDescriptor,
        token: &CancellationToken,
    ) -> Result<(), UploadFailure> {
        for progress in ProgressSteps::new(self.settings.increments) {
            if token.is_cancelled() {
                return Err(UploadFailure::Canceled);
            }
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(UploadFailure::Canceled),
                _ = tokio::time::sleep(self.settings.step_interval) => {}
            }
            self.store.update(&file.id, |f| f.with_progress(progress));
        }

        let Some(content) = file.content.clone() else {
            return Err(UploadFailure::MissingContent);
        };
        let payload = UploadPayload {
            file_id: file.id.clone(),
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            content,
        };

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(UploadFailure::Canceled),
            r = self.backend.upload(payload) => r?,
        };
        debug!(file = %file.id, remote_id = %response.id, "upload accepted");

        if self.settings.confirm_uploads {
            let request = UploadCompleteRequest {
                file_id: response.id,
                chunk_count: Some(1),
                total_size: Some(file.size),
            };
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(UploadFailure::Canceled),
                r = self.backend.complete_upload(request) => { r?; }
            }
        }

        Ok(())
    }

    /// Signals cancellation of an active upload. Returns `false` if the file
    /// has no active upload.
    pub fn cancel(&self, id: &str) -> bool {
        match self.lock_cancels().get(id) {
            Some(token) => {
                token.cancel();
                debug!(file = %id, "cancel requested");
                true
            }
            None => false,
        }
    }

    /// Returns an `error` or `canceled` file to `idle`.
    pub fn retry(&self, id: &str) -> bool {
        let retried = self.store.transact(|files| {
            let Some(pos) = files.iter().position(|f| f.id == id) else {
                return (None, false);
            };
            if !matches!(files[pos].status, FileStatus::Error { .. } | FileStatus::Canceled) {
                return (None, false);
            }
            let mut next = files.to_vec();
            next[pos] = files[pos].reset();
            (Some(next), true)
        });
        if retried {
            debug!(file = %id, "file reset for retry");
        }
        retried
    }

    /// Removes a file, canceling its upload first if one is active.
    pub fn remove(&self, id: &str) -> bool {
        self.cancel(id);
        let removed = self.store.remove(id).is_some();
        if removed {
            debug!(file = %id, "file removed");
        }
        removed
    }
}
