use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A file as selected by the user, before it enters the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFile {
    pub name: String,
    /// Size in bytes as reported by the source.
    pub size: u64,
    pub mime_type: String,
    pub content: Bytes,
}

impl RawFile {
    /// Creates a raw file whose size is the length of `content`.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            size: content.len() as u64,
            mime_type: mime_type.into(),
            content,
        }
    }

    /// Returns the deduplication key of this file.
    pub fn key(&self) -> FileKey {
        FileKey::new(&self.name, self.size)
    }
}

/// Identity used to detect duplicate selections: file name plus byte size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    pub name: String,
    pub size: u64,
}

impl FileKey {
    pub fn new(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            size,
        }
    }
}

/// Lifecycle state of a file, carrying only the fields valid for that state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    /// Eligible for upload.
    Idle,
    /// Upload in flight; `progress` is a percentage with one decimal.
    Uploading { progress: f64 },
    Done,
    /// Terminal failure with at least one message.
    Error { errors: Vec<String> },
    Canceled,
}

impl FileStatus {
    /// Short lowercase name of the state.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading { .. } => "uploading",
            Self::Done => "done",
            Self::Error { .. } => "error",
            Self::Canceled => "canceled",
        }
    }

    /// Returns `true` for `done`, `error` and `canceled`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. } | Self::Canceled)
    }
}

/// One file in the upload collection.
///
/// Descriptors are never edited once published: every transition returns a
/// new value and the caller swaps it into the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Binary content, owned until the descriptor is dropped.
    #[serde(skip)]
    pub content: Option<Bytes>,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileDescriptor {
    /// Wraps a raw file as a fresh `idle` descriptor with the given id.
    pub fn from_raw(id: String, file: RawFile) -> Self {
        Self {
            id,
            name: file.name,
            size: file.size,
            mime_type: file.mime_type,
            content: Some(file.content),
            status: FileStatus::Idle,
        }
    }

    pub fn key(&self) -> FileKey {
        FileKey::new(&self.name, self.size)
    }

    /// Current progress, only while uploading.
    pub fn progress(&self) -> Option<f64> {
        match self.status {
            FileStatus::Uploading { progress } => Some(progress),
            _ => None,
        }
    }

    /// Error messages, empty unless the file is in `error`.
    pub fn errors(&self) -> &[String] {
        match &self.status {
            FileStatus::Error { errors } => errors,
            _ => &[],
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == FileStatus::Idle
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.status, FileStatus::Uploading { .. })
    }

    pub fn is_done(&self) -> bool {
        self.status == FileStatus::Done
    }

    fn with_status(&self, status: FileStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// `idle → uploading` at 0 %. Other states are returned unchanged.
    pub fn begin_upload(&self) -> Self {
        match self.status {
            FileStatus::Idle => self.with_status(FileStatus::Uploading { progress: 0.0 }),
            _ => self.clone(),
        }
    }

    /// Sets progress while uploading, clamped to 0..=100 and rounded to one decimal.
    pub fn with_progress(&self, progress: f64) -> Self {
        match self.status {
            FileStatus::Uploading { .. } => self.with_status(FileStatus::Uploading {
                progress: crate::progress::round_one_decimal(progress.clamp(0.0, 100.0)),
            }),
            _ => self.clone(),
        }
    }

    /// `uploading → done`.
    pub fn complete(&self) -> Self {
        match self.status {
            FileStatus::Uploading { .. } => self.with_status(FileStatus::Done),
            _ => self.clone(),
        }
    }

    /// `uploading → error`. An empty list is replaced by a generic message.
    pub fn fail(&self, mut errors: Vec<String>) -> Self {
        if errors.is_empty() {
            errors.push("Upload failed".into());
        }
        match self.status {
            FileStatus::Uploading { .. } => self.with_status(FileStatus::Error { errors }),
            _ => self.clone(),
        }
    }

    /// `uploading → canceled`.
    pub fn cancel(&self) -> Self {
        match self.status {
            FileStatus::Uploading { .. } => self.with_status(FileStatus::Canceled),
            _ => self.clone(),
        }
    }

    /// `error | canceled → idle` (user retry). Other states are returned unchanged.
    pub fn reset(&self) -> Self {
        match self.status {
            FileStatus::Error { .. } | FileStatus::Canceled => self.with_status(FileStatus::Idle),
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileDescriptor {
        let content = Bytes::from_static(b"%PDF-1.7");
        let raw = RawFile::new("report.pdf", "application/pdf", content);
        FileDescriptor::from_raw("f1".into(), raw)
    }

    #[test]
    fn new_descriptor_is_idle() {
        let fd = sample();
        assert!(fd.is_idle());
        assert_eq!(fd.size, 8);
        assert!(fd.progress().is_none());
        assert!(fd.errors().is_empty());
        assert!(fd.content.is_some());
    }

    #[test]
    fn full_success_path() {
        let fd = sample().begin_upload();
        assert_eq!(fd.progress(), Some(0.0));

        let fd = fd.with_progress(42.26);
        assert_eq!(fd.progress(), Some(42.3));

        let fd = fd.with_progress(100.0).complete();
        assert!(fd.is_done());
        assert!(fd.progress().is_none());
    }

    #[test]
    fn progress_is_clamped() {
        let fd = sample().begin_upload().with_progress(130.0);
        assert_eq!(fd.progress(), Some(100.0));
        let fd = fd.with_progress(-5.0);
        assert_eq!(fd.progress(), Some(0.0));
    }

    #[test]
    fn progress_ignored_outside_uploading() {
        let fd = sample().with_progress(50.0);
        assert!(fd.is_idle());

        let done = sample().begin_upload().complete().with_progress(50.0);
        assert!(done.is_done());
        assert!(done.progress().is_none());
    }

    #[test]
    fn fail_carries_messages() {
        let fd = sample().begin_upload().fail(vec!["Request timeout".into()]);
        assert_eq!(fd.status.label(), "error");
        assert_eq!(fd.errors(), ["Request timeout".to_string()]);
    }

    #[test]
    fn fail_never_has_empty_errors() {
        let fd = sample().begin_upload().fail(Vec::new());
        assert_eq!(fd.errors().len(), 1);
    }

    #[test]
    fn retry_from_error_and_canceled() {
        let errored = sample().begin_upload().fail(vec!["boom".into()]);
        let reset = errored.reset();
        assert!(reset.is_idle());
        assert!(reset.errors().is_empty());

        let canceled = sample().begin_upload().cancel();
        assert_eq!(canceled.status, FileStatus::Canceled);
        assert!(canceled.reset().is_idle());
    }

    #[test]
    fn reset_leaves_done_and_uploading_alone() {
        let done = sample().begin_upload().complete();
        assert!(done.reset().is_done());

        let uploading = sample().begin_upload();
        assert!(uploading.reset().is_uploading());
    }

    #[test]
    fn terminal_states() {
        assert!(!FileStatus::Idle.is_terminal());
        assert!(!FileStatus::Uploading { progress: 1.0 }.is_terminal());
        assert!(FileStatus::Done.is_terminal());
        assert!(FileStatus::Canceled.is_terminal());
        assert!(FileStatus::Error { errors: vec!["x".into()] }.is_terminal());
    }

    #[test]
    fn json_flattens_status() {
        let fd = sample().begin_upload().with_progress(12.5);
        let json = serde_json::to_value(&fd).unwrap();
        assert_eq!(json["status"], "uploading");
        assert_eq!(json["progress"], 12.5);
        assert_eq!(json["type"], "application/pdf");
        assert!(json.get("content").is_none());

        let done = serde_json::to_value(fd.complete()).unwrap();
        assert_eq!(done["status"], "done");
        assert!(done.get("progress").is_none());
    }
}
