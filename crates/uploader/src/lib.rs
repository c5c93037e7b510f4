//! Client side of the document upload flow.
//!
//! Files enter through [`Intake`], are uploaded by the
//! [`UploadOrchestrator`] with bounded concurrency, and are referenced by
//! one final call made by the [`SubmissionCoordinator`]. All three share a
//! copy-on-write [`FileStore`].

mod backend;
mod error;
mod http;
mod intake;
mod orchestrator;
mod session;
mod settings;
mod store;
mod submit;

pub use backend::{Backend, BackendFuture, UploadPayload};
pub use error::{ApiError, SubmitError, UploadFailure};
pub use http::HttpBackend;
pub use intake::{Intake, IntakeReport, Rejection};
pub use orchestrator::{FileOutcome, RunSummary, UploadOrchestrator};
pub use session::UploadSession;
pub use settings::{DEFAULT_POOL_SIZE, DEFAULT_STEP_INTERVAL, UploadSettings};
pub use store::{FileStore, Snapshot};
pub use submit::{SubmissionCoordinator, SubmitForm};
