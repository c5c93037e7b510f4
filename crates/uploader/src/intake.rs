//! Intake front-end: count gate, per-file validation, deduplication and
//! user notices for one batch of selected files.

use docdrop_notices::{NoticeLevel, Notifier};
use docdrop_transfer::{
    IntakeLimits, RawFile, Violation, check_file_count, dedupe_batch, validate_file,
};
use tracing::debug;

use crate::store::FileStore;

const ADDED_DURATION_MS: u64 = 3000;
const REJECTED_DURATION_MS: u64 = 8000;

/// A file refused by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub name: String,
    pub violations: Vec<Violation>,
}

/// Outcome of one [`Intake::add_files`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeReport {
    /// Ids of the descriptors appended to the collection.
    pub added: Vec<String>,
    pub rejected: Vec<Rejection>,
    /// Valid files skipped because their `(name, size)` was already known.
    pub duplicates: usize,
    /// The whole batch was refused by the file count limit.
    pub limit_exceeded: bool,
}

/// Adds user-selected files to a [`FileStore`].
#[derive(Debug, Clone)]
pub struct Intake {
    store: FileStore,
    notifier: Notifier,
    limits: IntakeLimits,
}

impl Intake {
    pub fn new(store: FileStore, notifier: Notifier, limits: IntakeLimits) -> Self {
        Self {
            store,
            notifier,
            limits,
        }
    }

    pub fn limits(&self) -> &IntakeLimits {
        &self.limits
    }

    /// Validates and deduplicates `batch`, appending the survivors.
    ///
    /// Exceeding the file count limit rejects the whole batch. Invalid
    /// files are reported together in one error notice and never become
    /// descriptors.
    pub fn add_files(&self, batch: Vec<RawFile>) -> IntakeReport {
        let mut report = IntakeReport::default();
        if batch.is_empty() {
            return report;
        }

        let limits = &self.limits;
        let (added, duplicates, limit_error, rejected) = self.store.transact(|files| {
            if let Err(e) = check_file_count(files.len(), batch.len(), limits) {
                return (None, (Vec::new(), 0, Some(e), Vec::new()));
            }

            let mut valid = Vec::new();
            let mut rejected = Vec::new();
            for file in batch {
                let violations = validate_file(&file, limits);
                if violations.is_empty() {
                    valid.push(file);
                } else {
                    rejected.push(Rejection {
                        name: file.name,
                        violations,
                    });
                }
            }

            let valid_count = valid.len();
            let fresh = dedupe_batch(valid, files);
            let duplicates = valid_count - fresh.len();
            let ids: Vec<String> = fresh.iter().map(|f| f.id.clone()).collect();

            let next = if fresh.is_empty() {
                None
            } else {
                let mut next = files.to_vec();
                next.extend(fresh);
                Some(next)
            };
            (next, (ids, duplicates, None, rejected))
        });

        if let Some(e) = limit_error {
            debug!(
                existing = e.existing,
                incoming = e.incoming,
                "file limit exceeded"
            );
            self.notifier.warning(
                "File limit exceeded",
                format!(
                    "You cannot add more than {} files. You currently have {} file(s).",
                    e.max, e.existing
                ),
            );
            report.limit_exceeded = true;
            return report;
        }

        if !rejected.is_empty() {
            let lines: Vec<String> = rejected
                .iter()
                .map(|r| {
                    let msgs: Vec<String> = r.violations.iter().map(|v| v.to_string()).collect();
                    format!("• {}: {}", r.name, msgs.join(", "))
                })
                .collect();
            self.notifier.notify(
                NoticeLevel::Error,
                "Invalid files",
                Some(format!(
                    "Found {} file(s) with errors:\n{}",
                    rejected.len(),
                    lines.join("\n")
                )),
                REJECTED_DURATION_MS,
            );
        }

        if !added.is_empty() {
            self.notifier.notify(
                NoticeLevel::Success,
                "Files added",
                Some(format!("{} file(s) added successfully", added.len())),
                ADDED_DURATION_MS,
            );
        } else if duplicates > 0 {
            self.notifier.warning(
                "Duplicate files",
                "The selected files have already been added",
            );
        }

        debug!(
            added = added.len(),
            rejected = rejected.len(),
            duplicates,
            "intake finished"
        );
        report.added = added;
        report.rejected = rejected;
        report.duplicates = duplicates;
        report
    }
}
