//! Plain-text rendering of the file table and notices.

use std::collections::HashMap;

use docdrop_notices::Notice;
use docdrop_transfer::{FileDescriptor, FileStatus, format_file_size};

/// One table row: `#  name  size  status`.
pub fn file_row(index: usize, file: &FileDescriptor) -> String {
    let status = match &file.status {
        FileStatus::Uploading { progress } => format!("uploading {progress:>5.1}%"),
        FileStatus::Error { errors } => format!("error: {}", errors.join("; ")),
        other => other.label().to_string(),
    };
    format!(
        "{:>2}  {:<32}  {:>10}  {}",
        index + 1,
        file.name,
        format_file_size(file.size),
        status
    )
}

pub fn file_table(files: &[FileDescriptor]) -> String {
    if files.is_empty() {
        return "  (no files)".to_string();
    }
    files
        .iter()
        .enumerate()
        .map(|(i, f)| file_row(i, f))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remembers the last printed status of each file so only changes are shown.
#[derive(Debug, Default)]
pub struct StatusLabels {
    seen: HashMap<String, &'static str>,
}

impl StatusLabels {
    /// Lines for files whose status changed since the previous call.
    pub fn transitions(&mut self, files: &[FileDescriptor]) -> Vec<String> {
        let mut lines = Vec::new();
        for file in files {
            let label = file.status.label();
            if self.seen.insert(file.id.clone(), label) == Some(label) {
                continue;
            }
            match &file.status {
                FileStatus::Error { errors } => {
                    lines.push(format!("  {}: error ({})", file.name, errors.join("; ")))
                }
                _ => lines.push(format!("  {}: {label}", file.name)),
            }
        }
        self.seen.retain(|id, _| files.iter().any(|f| &f.id == id));
        lines
    }
}

/// Notices go to stderr so `--json` output stays clean.
pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("{notice}");
    }
}

/// Resolves a user reference to a file id: a 1-based row number, a file
/// name, or a unique id prefix.
pub fn resolve_file(files: &[FileDescriptor], reference: &str) -> Option<String> {
    if let Ok(n) = reference.parse::<usize>() {
        if (1..=files.len()).contains(&n) {
            return Some(files[n - 1].id.clone());
        }
    }
    if let Some(f) = files.iter().find(|f| f.name == reference) {
        return Some(f.id.clone());
    }
    let mut matches = files.iter().filter(|f| f.id.starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(f), None) => Some(f.id.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use docdrop_transfer::RawFile;

    fn file(id: &str, name: &str) -> FileDescriptor {
        FileDescriptor::from_raw(
            id.into(),
            RawFile::new(name, "application/pdf", Bytes::from_static(b"%PDF-1.4")),
        )
    }

    #[test]
    fn rows_show_status() {
        let idle = file("1", "a.pdf");
        assert!(file_row(0, &idle).ends_with("idle"));

        let uploading = idle.begin_upload().with_progress(42.5);
        assert!(file_row(0, &uploading).contains("uploading  42.5%"));

        let failed = idle.begin_upload().fail(vec!["Request timeout".into()]);
        assert!(file_row(1, &failed).contains("error: Request timeout"));
        assert!(file_row(1, &failed).starts_with(" 2"));
    }

    #[test]
    fn resolve_by_index_name_or_prefix() {
        let files = vec![file("abc-1", "a.pdf"), file("abd-2", "b.pdf")];
        assert_eq!(resolve_file(&files, "2").as_deref(), Some("abd-2"));
        assert_eq!(resolve_file(&files, "a.pdf").as_deref(), Some("abc-1"));
        assert_eq!(resolve_file(&files, "abc").as_deref(), Some("abc-1"));
        assert_eq!(resolve_file(&files, "ab"), None);
        assert_eq!(resolve_file(&files, "9"), None);
    }

    #[test]
    fn transitions_only_report_changes() {
        let mut labels = StatusLabels::default();
        let a = file("1", "a.pdf");
        assert_eq!(labels.transitions(&[a.clone()]), vec!["  a.pdf: idle"]);
        assert!(labels.transitions(&[a.clone()]).is_empty());

        let uploading = a.begin_upload();
        let started = labels.transitions(&[uploading.clone()]);
        assert_eq!(started, vec!["  a.pdf: uploading"]);
        // Progress changes keep the same label.
        let progressed = uploading.with_progress(30.0);
        assert!(labels.transitions(&[progressed]).is_empty());

        let failed = uploading.fail(vec!["Payload too large".into()]);
        assert_eq!(
            labels.transitions(&[failed]),
            vec!["  a.pdf: error (Payload too large)"]
        );
    }

    #[test]
    fn empty_table() {
        assert_eq!(file_table(&[]), "  (no files)");
    }
}
