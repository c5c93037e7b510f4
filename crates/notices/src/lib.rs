//! User-facing notices.
//!
//! The upload flow reports what happened ("files added", "duplicate
//! files", "submission failed: ...") as [`Notice`]s. Presentation and
//! timed dismissal belong to whichever surface drains the queue.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Default display duration in milliseconds.
pub const DEFAULT_DURATION_MS: u64 = 4000;

/// Display duration for error notices.
pub const ERROR_DURATION_MS: u64 = 6000;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    fn default_duration(self) -> u64 {
        match self {
            Self::Error => ERROR_DURATION_MS,
            _ => DEFAULT_DURATION_MS,
        }
    }
}

/// A single notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub title: String,
    pub message: Option<String>,
    pub duration_ms: u64,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.title)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Ordered notice queue with monotonic ids.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    notices: Vec<Notice>,
    next_id: u64,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a notice and returns its id.
    pub fn push(
        &mut self,
        level: NoticeLevel,
        title: impl Into<String>,
        message: Option<String>,
        duration_ms: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.notices.push(Notice {
            id,
            level,
            title: title.into(),
            message,
            duration_ms,
        });
        id
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Removes and returns every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

/// Cloneable handle to a shared [`NoticeQueue`].
///
/// Every notice is also logged through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Arc<Mutex<NoticeQueue>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a notice with an explicit duration.
    pub fn notify(
        &self,
        level: NoticeLevel,
        title: impl Into<String>,
        message: Option<String>,
        duration_ms: u64,
    ) -> u64 {
        let title = title.into();
        match level {
            NoticeLevel::Error => tracing::warn!(title = %title, message = ?message, "notice"),
            _ => tracing::info!(title = %title, message = ?message, "notice"),
        }
        let mut q = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        q.push(level, title, message, duration_ms)
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        let level = NoticeLevel::Success;
        self.notify(level, title, Some(message.into()), level.default_duration())
    }

    pub fn warning(&self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        let level = NoticeLevel::Warning;
        self.notify(level, title, Some(message.into()), level.default_duration())
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        let level = NoticeLevel::Error;
        self.notify(level, title, Some(message.into()), level.default_duration())
    }

    /// Takes every pending notice.
    pub fn drain(&self) -> Vec<Notice> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).drain()
    }

    /// Copy of the pending notices without removing them.
    pub fn pending(&self) -> Vec<Notice> {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}
