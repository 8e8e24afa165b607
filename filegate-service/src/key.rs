//! Object key derivation and content-type resolution.

use std::time::{SystemTime, UNIX_EPOCH};

/// Fallback content type when neither the upload nor the filename
/// extension yields one.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Derives the storage key for a newly uploaded file.
///
/// The key concatenates the upload time in unix milliseconds with the raw
/// filename, preserving the extension for MIME inference. Two uploads of
/// the same filename within the same millisecond collide; this is a
/// documented, unmitigated risk.
pub fn derive_key(filename: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{millis}_{filename}")
}

/// Resolves the content type to record for an upload.
///
/// Prefers the type declared by the client, then an extension-based
/// lookup on the filename, then a generic binary type.
pub fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    match declared {
        Some(declared) if !declared.is_empty() => declared.to_owned(),
        _ => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or(OCTET_STREAM)
            .to_owned(),
    }
}

/// Returns the basename of a key, stripping any path-like prefix.
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
