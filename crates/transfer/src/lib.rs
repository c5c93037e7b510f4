//! File model, intake rules, progress simulation and the bounded runner.
//!
//! This crate has no network or runtime dependencies: everything here is a
//! pure transformation or a runtime-agnostic future.

mod intake;
mod pool;
mod progress;
mod size;
mod types;
mod validation;

pub use intake::{dedupe_batch, new_file_id};
pub use pool::{TaskError, TaskResult, run_bounded};
pub use progress::{IncrementRange, ProgressSteps, round_one_decimal};
pub use size::{SizeUnit, bytes_to_unit, format_file_size, is_file_size_valid};
pub use types::{FileDescriptor, FileKey, FileStatus, RawFile};
pub use validation::{
    FileLimitExceeded, IntakeLimits, Violation, check_file_count, validate_file,
};
