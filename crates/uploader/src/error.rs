//! Error types for the upload flow.

use docdrop_protocol::UploadErrorKind;

/// Errors returned by a [`Backend`](crate::Backend).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` comes from the `{error}` body when present.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Upload error classification derived from the status.
    pub fn kind(&self) -> Option<UploadErrorKind> {
        self.status().and_then(UploadErrorKind::from_status)
    }
}

/// Why a single file upload did not reach `done`.
#[derive(Debug, thiserror::Error)]
pub enum UploadFailure {
    #[error("cancelled")]
    Canceled,

    #[error("File content is not available")]
    MissingContent,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl UploadFailure {
    /// Message stored on the descriptor when the upload ends in `error`.
    ///
    /// Malformed responses collapse to a generic message.
    pub fn reason(&self) -> String {
        match self {
            Self::Api(ApiError::Decode(_)) => "Upload failed".into(),
            Self::Api(ApiError::Status { message, .. }) if message.is_empty() => {
                "Upload failed".into()
            }
            other => other.to_string(),
        }
    }

    /// Server-side classification, for rejected requests only.
    pub fn kind(&self) -> Option<UploadErrorKind> {
        match self {
            Self::Api(e) => e.kind(),
            _ => None,
        }
    }

    /// Returns `true` if retrying the same file may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(ApiError::Http(_)) => true,
            _ => self.kind().is_some_and(UploadErrorKind::is_transient),
        }
    }
}

/// Errors returned by [`SubmissionCoordinator::submit`](crate::SubmissionCoordinator::submit).
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{pending} file(s) are not uploaded yet")]
    Pending { pending: usize },

    #[error("no files to submit")]
    Empty,

    #[error("a submission is already in progress")]
    Busy,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SubmitError {
    /// Returns `true` if the request never reached the network.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Pending { .. } | Self::Empty | Self::Busy)
    }
}
