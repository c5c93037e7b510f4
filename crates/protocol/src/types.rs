use serde::{Deserialize, Serialize};

/// Classification of a failed upload, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadErrorKind {
    NoFileProvided,
    InvalidFileType,
    FileTooLarge,
    InternalError,
    ServiceUnavailable,
    InsufficientStorage,
    RequestTimeout,
    PayloadTooLarge,
}

impl UploadErrorKind {
    /// Maps a failure status code to its error kind.
    ///
    /// A 400 is reported as [`NoFileProvided`](Self::NoFileProvided); the
    /// body message distinguishes the other validation failures.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            400 => Some(Self::NoFileProvided),
            408 => Some(Self::RequestTimeout),
            413 => Some(Self::PayloadTooLarge),
            500 => Some(Self::InternalError),
            503 => Some(Self::ServiceUnavailable),
            507 => Some(Self::InsufficientStorage),
            _ => None,
        }
    }

    /// Returns `true` for failures caused by the server rather than the request.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::InternalError
                | Self::ServiceUnavailable
                | Self::InsufficientStorage
                | Self::RequestTimeout
        )
    }
}
