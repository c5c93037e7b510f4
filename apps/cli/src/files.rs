//! Loading files from disk into [`RawFile`]s.

use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use docdrop_protocol::PDF_MIME_TYPE;
use docdrop_transfer::RawFile;

const OCTET_STREAM: &str = "application/octet-stream";
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Detects the MIME type of a file by extension, falling back to content.
pub fn detect_content_type(name: &str, content: &[u8]) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("pdf") => PDF_MIME_TYPE,
        _ if content.starts_with(PDF_MAGIC) => PDF_MIME_TYPE,
        _ => OCTET_STREAM,
    }
}

/// Reads `path` fully into memory.
pub fn read_file(path: &Path) -> anyhow::Result<RawFile> {
    let content =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = detect_content_type(&name, &content);
    Ok(RawFile::new(name, mime_type, Bytes::from(content)))
}

/// Reads every path, stopping at the first unreadable one.
pub fn read_files(paths: &[impl AsRef<Path>]) -> anyhow::Result<Vec<RawFile>> {
    paths.iter().map(|p| read_file(p.as_ref())).collect()
}
