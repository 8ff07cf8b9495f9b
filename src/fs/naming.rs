//! Filename generation and manipulation.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Longest stem kept from a pin title.
const MAX_BASE_NAME_LEN: usize = 96;

/// Stem used when a pin has no usable title.
pub const DEFAULT_BASE_NAME: &str = "pin";

/// Validate and sanitize a filename by removing or replacing invalid characters.
///
/// Returns an error if the filename contains path traversal patterns.
pub fn sanitize_filename(name: &str) -> Result<String> {
    // Reject path traversal attempts
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    // Sanitize remaining problematic characters
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Turn a free-form pin title into a short ASCII filename stem.
///
/// Runs of anything outside `[A-Za-z0-9._-]` become `_`, dot runs collapse,
/// and the result is capped at 96 characters. Falls back to `pin`.
pub fn base_name_from_title(title: Option<&str>) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    static DOTS: OnceLock<Regex> = OnceLock::new();
    let unsafe_re = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());
    let dots_re = DOTS.get_or_init(|| Regex::new(r"\.{2,}").unwrap());

    let Some(title) = title else {
        return DEFAULT_BASE_NAME.to_string();
    };

    let slug = unsafe_re.replace_all(title.trim(), "_");
    let slug = dots_re.replace_all(&slug, ".");
    let slug: String = slug.chars().take(MAX_BASE_NAME_LEN).collect();
    let slug = slug.trim_matches(|c| matches!(c, '_' | '.' | '-'));

    if slug.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        slug.to_string()
    }
}

/// `<stem>.<ext>` for `attempt` 0, `<stem>_<attempt>.<ext>` after that.
pub fn numbered_filename(stem: &str, ext: &str, attempt: u32) -> String {
    match (attempt, ext.is_empty()) {
        (0, true) => stem.to_string(),
        (0, false) => format!("{}.{}", stem, ext),
        (n, true) => format!("{}_{}", stem, n),
        (n, false) => format!("{}_{}.{}", stem, n, ext),
    }
}
