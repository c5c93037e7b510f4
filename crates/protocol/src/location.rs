//! Location references of stored files.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Base of the location reference when none is configured.
pub const DEFAULT_STORAGE_BASE_URL: &str = "https://storage.example.com/uploads";

/// Characters escaped in a URI component: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds `{base}/{id}/{name}` with `name` escaped as a URI component.
pub fn storage_url(base: &str, id: &str, name: &str) -> String {
    format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        id,
        utf8_percent_encode(name, URI_COMPONENT)
    )
}
