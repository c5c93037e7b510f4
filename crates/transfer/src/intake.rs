use std::collections::HashSet;

use uuid::Uuid;

use crate::types::{FileDescriptor, FileKey, RawFile};

/// Generates a new unique file id (random UUID v4).
pub fn new_file_id() -> String {
    Uuid::new_v4().to_string()
}

/// Turns a batch of raw files into new `idle` descriptors.
///
/// Keeps the first occurrence of each `(name, size)` key within the batch
/// and drops any file whose key is already present in `existing`. Order of
/// the surviving files is preserved.
pub fn dedupe_batch(batch: Vec<RawFile>, existing: &[FileDescriptor]) -> Vec<FileDescriptor> {
    let mut seen: HashSet<FileKey> = existing.iter().map(FileDescriptor::key).collect();

    batch
        .into_iter()
        .filter(|file| seen.insert(file.key()))
        .map(|file| FileDescriptor::from_raw(new_file_id(), file))
        .collect()
}
