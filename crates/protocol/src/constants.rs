/// MIME type of the only accepted document format.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// MIME types accepted by the upload endpoint.
pub const ALLOWED_MIME_TYPES: &[&str] = &[PDF_MIME_TYPE];

/// Maximum size of a single uploaded file (5 MiB).
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum number of files attached to one submission.
pub const MAX_FILES: usize = 10;

/// Single-file upload endpoint (multipart POST).
pub const UPLOAD_PATH: &str = "/api/upload";

/// Optional upload confirmation endpoint (JSON POST).
pub const UPLOAD_COMPLETE_PATH: &str = "/api/upload/complete";

/// Final form submission endpoint (JSON POST).
pub const SUBMIT_PATH: &str = "/api/submit";

/// Name of the multipart field carrying the file.
pub const UPLOAD_FIELD_NAME: &str = "file";
