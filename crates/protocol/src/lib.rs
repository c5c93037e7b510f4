//! Wire types shared by the docdrop client and the mock backend.
//!
//! The contract covers two endpoints (`/api/upload`, `/api/submit`) plus the
//! optional `/api/upload/complete` confirmation. Every failure response
//! carries an [`ApiErrorBody`].

pub mod constants;
pub mod location;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{
    ALLOWED_MIME_TYPES, MAX_FILE_SIZE, MAX_FILES, PDF_MIME_TYPE, SUBMIT_PATH, UPLOAD_COMPLETE_PATH,
    UPLOAD_FIELD_NAME, UPLOAD_PATH,
};
pub use location::{DEFAULT_STORAGE_BASE_URL, storage_url};
pub use messages::{
    ApiErrorBody, SubmitFile, SubmitRequest, SubmitResponse, SubmittedData,
    UploadCompleteRequest, UploadCompleteResponse, UploadResponse,
};
pub use types::UploadErrorKind;
