//! Upload admissibility and identifier safety.
//!
//! Everything here is a pure function: no I/O, no side effects. The store runs
//! these checks before it touches the storage root, so a rejected upload never
//! leaves a directory behind.

/// Limits an upload is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    /// Inclusive ceiling on the upload size in bytes.
    pub max_bytes: u64,
    /// Lowercase extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
}

/// Lowercased extension of `file_name`, without the dot.
///
/// Returns `None` for names without an extension, dotfiles (`.jpg`), and
/// names ending in a dot.
///
/// ```text
/// "Photo.JPG"    → Some("jpg")
/// "archive.tar"  → Some("tar")
/// ".jpg"         → None
/// "README"       → None
/// ```
pub fn extension_of(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Decide whether an upload may be accepted.
///
/// Rejects when `declared_size` exceeds the ceiling (a file exactly at the
/// ceiling is accepted) or when the extension, compared case-insensitively,
/// is not in the allow-list.
pub fn is_admissible(file_name: &str, declared_size: u64, limits: &UploadLimits) -> bool {
    if declared_size > limits.max_bytes {
        return false;
    }
    match extension_of(file_name) {
        Some(ext) => limits.allowed_extensions.iter().any(|allowed| *allowed == ext),
        None => false,
    }
}

const MAX_NAME_LEN: usize = 128;

/// Whether `name` is safe to use as a single path component under the
/// storage root.
///
/// Only ASCII alphanumerics, `-` and `_` are allowed, which rules out path
/// separators, `.`/`..` segments, drive prefixes and NUL bytes in one check.
/// Used for both image identifiers and variant names.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Guess a MIME type from an allowed extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
