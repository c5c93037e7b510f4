use docdrop_protocol::{ALLOWED_MIME_TYPES, MAX_FILE_SIZE, MAX_FILES};

use crate::size::format_file_size;
use crate::types::RawFile;

/// Limits applied when files enter the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeLimits {
    pub max_files: usize,
    pub max_file_size: u64,
    pub allowed_types: Vec<String>,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_files: MAX_FILES,
            max_file_size: MAX_FILE_SIZE,
            allowed_types: ALLOWED_MIME_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A rule broken by a single candidate file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("File type not allowed. Accepted: {}", .allowed.join(", "))]
    DisallowedType {
        mime_type: String,
        allowed: Vec<String>,
    },

    #[error("File too large. Maximum {}", size_label(.max))]
    TooLarge { size: u64, max: u64 },
}

fn size_label(bytes: &u64) -> String {
    format_file_size(*bytes)
}

/// The batch would push the collection over its file count limit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot add more than {max} files ({existing} already selected, {incoming} incoming)")]
pub struct FileLimitExceeded {
    pub existing: usize,
    pub incoming: usize,
    pub max: usize,
}

/// Checks every rule against `file` and returns all violations, in rule order.
pub fn validate_file(file: &RawFile, limits: &IntakeLimits) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !limits.allowed_types.iter().any(|t| t == &file.mime_type) {
        violations.push(Violation::DisallowedType {
            mime_type: file.mime_type.clone(),
            allowed: limits.allowed_types.clone(),
        });
    }

    if file.size > limits.max_file_size {
        violations.push(Violation::TooLarge {
            size: file.size,
            max: limits.max_file_size,
        });
    }

    violations
}

/// All-or-nothing count gate for one intake call.
pub fn check_file_count(
    existing: usize,
    incoming: usize,
    limits: &IntakeLimits,
) -> Result<(), FileLimitExceeded> {
    if existing + incoming > limits.max_files {
        return Err(FileLimitExceeded {
            existing,
            incoming,
            max: limits.max_files,
        });
    }
    Ok(())
}
