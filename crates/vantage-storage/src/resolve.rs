//! Asset path resolution with containment checks.
//!
//! A requested path is resolved against a base directory in three steps: a
//! lexical guard (no absolute paths, drive prefixes or `..`), a lookup that
//! retries the NFD and NFC forms of the name when the literal one is missing,
//! and a containment check on the canonicalized result.

use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::error::{StorageError, StorageResult};

/// Validate a client-supplied relative path and convert it to a `PathBuf`.
///
/// Both `/` and `\` are treated as separators. Empty and `.` segments are
/// dropped.
pub fn lexical_guard(requested: &str) -> StorageResult<PathBuf> {
    let escape = || StorageError::PathEscape(requested.to_string());

    if requested.starts_with('/') || requested.starts_with('\\') {
        return Err(escape());
    }

    let mut path = PathBuf::new();
    for (i, segment) in requested.split(|c: char| c == '/' || c == '\\').enumerate() {
        match segment {
            "" | "." => continue,
            ".." => return Err(escape()),
            s if i == 0 && has_drive_prefix(s) => return Err(escape()),
            s => path.push(s),
        }
    }

    if path.has_root() {
        return Err(escape());
    }

    Ok(path)
}

fn has_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Candidate spellings of a path: literal, NFD, NFC (duplicates removed)
fn normalization_candidates(relative: &Path) -> Vec<PathBuf> {
    let literal = relative.to_string_lossy().into_owned();
    let nfd: String = literal.nfd().collect();
    let nfc: String = literal.nfc().collect();

    let mut candidates = vec![relative.to_path_buf()];
    for form in [nfd, nfc] {
        let form = PathBuf::from(form);
        if !candidates.contains(&form) {
            candidates.push(form);
        }
    }
    candidates
}

/// Resolve `requested` inside `base` and return the canonical path of an
/// existing regular file.
///
/// Errors: `PathEscape` for lexical violations or a canonical path outside
/// `base`, `NotFound` when nothing matches or the match is not a file.
pub async fn resolve_within(base: &Path, requested: &str) -> StorageResult<PathBuf> {
    let relative = lexical_guard(requested)?;
    if relative.as_os_str().is_empty() {
        return Err(StorageError::NotFound(requested.to_string()));
    }

    let base_canonical = tokio::fs::canonicalize(base)
        .await
        .map_err(|_| StorageError::NotFound(requested.to_string()))?;

    let mut found = None;
    for candidate in normalization_candidates(&relative) {
        let path = base.join(&candidate);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            found = Some(path);
            break;
        }
    }

    let Some(path) = found else {
        return Err(StorageError::NotFound(requested.to_string()));
    };

    let canonical = tokio::fs::canonicalize(&path).await?;
    if !canonical.starts_with(&base_canonical) {
        tracing::warn!(
            base = %base_canonical.display(),
            requested = %requested,
            "Resolved path escapes base directory"
        );
        return Err(StorageError::PathEscape(requested.to_string()));
    }

    let metadata = tokio::fs::metadata(&canonical).await?;
    if !metadata.is_file() {
        return Err(StorageError::NotFound(requested.to_string()));
    }

    Ok(canonical)
}
