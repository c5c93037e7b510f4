//! One upload view: the shared collection plus the components that act on it.

use std::sync::Arc;

use docdrop_notices::Notifier;
use docdrop_protocol::SubmitResponse;
use docdrop_transfer::{IntakeLimits, RawFile};
use tokio::sync::watch;

use crate::backend::Backend;
use crate::error::SubmitError;
use crate::intake::{Intake, IntakeReport};
use crate::orchestrator::{RunSummary, UploadOrchestrator};
use crate::settings::UploadSettings;
use crate::store::{FileStore, Snapshot};
use crate::submit::{SubmissionCoordinator, SubmitForm};

/// Wires intake, orchestrator and coordinator to a single [`FileStore`]
/// and [`Notifier`].
#[derive(Clone)]
pub struct UploadSession {
    store: FileStore,
    notifier: Notifier,
    intake: Intake,
    orchestrator: Arc<UploadOrchestrator>,
    coordinator: Arc<SubmissionCoordinator>,
}

impl UploadSession {
    pub fn new(
        backend: Arc<dyn Backend>,
        limits: IntakeLimits,
        settings: UploadSettings,
        storage_base_url: &str,
    ) -> Self {
        let store = FileStore::new();
        let notifier = Notifier::new();
        let intake = Intake::new(store.clone(), notifier.clone(), limits);
        let orchestrator = Arc::new(UploadOrchestrator::new(
            Arc::clone(&backend),
            store.clone(),
            settings,
        ));
        let coordinator = Arc::new(
            SubmissionCoordinator::new(backend, store.clone(), notifier.clone())
                .with_storage_base_url(storage_base_url),
        );
        Self {
            store,
            notifier,
            intake,
            orchestrator,
            coordinator,
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn orchestrator(&self) -> &Arc<UploadOrchestrator> {
        &self.orchestrator
    }

    pub fn coordinator(&self) -> &Arc<SubmissionCoordinator> {
        &self.coordinator
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.store.subscribe()
    }

    pub fn add_files(&self, batch: Vec<RawFile>) -> IntakeReport {
        self.intake.add_files(batch)
    }

    pub async fn start_upload(&self) -> Option<RunSummary> {
        self.orchestrator.start_upload().await
    }

    pub fn cancel(&self, id: &str) -> bool {
        self.orchestrator.cancel(id)
    }

    pub fn retry(&self, id: &str) -> bool {
        self.orchestrator.retry(id)
    }

    pub fn remove(&self, id: &str) -> bool {
        self.orchestrator.remove(id)
    }

    pub async fn submit(&self, form: &SubmitForm) -> Result<SubmitResponse, SubmitError> {
        self.coordinator.submit(form).await
    }
}
