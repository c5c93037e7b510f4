//! Mock backend for the docdrop upload flow.
//!
//! Serves `/api/upload`, `/api/upload/complete` and `/api/submit` with
//! random latency and random failures so clients can exercise their error
//! paths. Every knob lives in [`MockConfig`].

mod config;
mod handlers;
mod server;

pub use config::{LatencyRange, MockConfig};
pub use handlers::{SUBMIT_FAILURE, UPLOAD_FAILURES, router};
pub use server::MockServer;

/// Errors produced by the mock server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server already running")]
    AlreadyRunning,
}
