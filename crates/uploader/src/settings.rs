use std::time::Duration;

use docdrop_transfer::IncrementRange;

/// Default number of uploads in flight.
pub const DEFAULT_POOL_SIZE: usize = 3;

/// Default wait between simulated progress steps.
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(200);

/// Tuning knobs of the upload orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSettings {
    /// Maximum uploads running at once.
    pub pool_size: usize,
    /// Wait before each simulated progress step.
    pub step_interval: Duration,
    /// Random increment bounds of each progress step.
    pub increments: IncrementRange,
    /// Call the completion endpoint after each successful upload.
    pub confirm_uploads: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            step_interval: DEFAULT_STEP_INTERVAL,
            increments: IncrementRange::default(),
            confirm_uploads: false,
        }
    }
}
