//! Ingestion helpers: entry-point selection and zip expansion.
//!
//! Zip expansion is synchronous and must run on a blocking worker.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;

use crate::error::{StorageError, StorageResult};

/// One uploaded item, as received from the client
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub filename: String,
    pub data: Bytes,
}

impl UploadItem {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Result of writing an upload to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// `{company}/{title}` relative to the upload root
    pub directory: String,
    /// Entry point relative to the upload root, empty when nothing was produced
    pub entry_point: String,
    /// Every other produced file, deduplicated, in upload/extraction order
    pub supporting_files: Vec<String>,
    /// Bytes of plain files and expanded members; expanded zip containers excluded
    pub total_size: u64,
}

impl IngestOutcome {
    pub fn file_count(&self) -> usize {
        usize::from(!self.entry_point.is_empty()) + self.supporting_files.len()
    }
}

/// A file produced by ingestion: path relative to the report directory and its size
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProducedFile {
    pub relative: String,
    pub size: u64,
}

/// Pick the entry point among produced paths.
///
/// Priority: first `main.html` or `index.html` (case-insensitive), then the
/// first `.html` file, then the first file of any type.
pub fn select_entry_point(paths: &[String]) -> Option<usize> {
    let file_name = |p: &str| p.rsplit('/').next().unwrap_or(p).to_lowercase();

    paths
        .iter()
        .position(|p| matches!(file_name(p).as_str(), "main.html" | "index.html"))
        .or_else(|| paths.iter().position(|p| file_name(p).ends_with(".html")))
        .or(if paths.is_empty() { None } else { Some(0) })
}

/// Split produced paths into (entry point, supporting files). Duplicates are
/// dropped keeping the first occurrence, and the entry point never appears
/// among the supporting files.
pub(crate) fn partition(paths: Vec<String>) -> (String, Vec<String>) {
    let mut unique: Vec<String> = Vec::with_capacity(paths.len());
    for path in paths {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }

    match select_entry_point(&unique) {
        Some(index) => {
            let entry = unique.remove(index);
            (entry, unique)
        }
        None => (String::new(), unique),
    }
}

/// Archive members that only carry platform metadata
fn is_platform_metadata(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name == "__MACOSX" || name == ".DS_Store" || name.starts_with("._")
        }
        _ => false,
    })
}

fn to_slash_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Expand `zip_path` into `dest`. On failure, members already written are
/// removed and the error is returned; the archive itself is left untouched.
pub(crate) fn expand_zip(zip_path: &Path, dest: &Path) -> StorageResult<Vec<ProducedFile>> {
    let mut written: Vec<PathBuf> = Vec::new();

    match extract_members(zip_path, dest, &mut written) {
        Ok(produced) => Ok(produced),
        Err(e) => {
            for path in written.iter().rev() {
                if let Err(remove_err) = fs::remove_file(path) {
                    tracing::warn!(
                        path = %path.display(),
                        error = %remove_err,
                        "Failed to remove partially extracted member"
                    );
                }
            }
            Err(e)
        }
    }
}

fn extract_members(
    zip_path: &Path,
    dest: &Path,
    written: &mut Vec<PathBuf>,
) -> StorageResult<Vec<ProducedFile>> {
    let file = fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| StorageError::Archive(format!("Failed to open archive: {}", e)))?;

    let mut produced = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| StorageError::Archive(format!("Failed to read entry {}: {}", index, e)))?;

        if entry.is_dir() {
            continue;
        }

        // enclosed_name is None for absolute names and names with `..`
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!(entry = %entry.name(), "Skipping archive entry outside destination");
            continue;
        };

        if is_platform_metadata(&relative) {
            continue;
        }

        let Some(slash_path) = to_slash_path(&relative) else {
            continue;
        };

        let out_path = dest.join(&relative);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = fs::File::create(&out_path)?;
        written.push(out_path);
        let size = io::copy(&mut entry, &mut out)
            .map_err(|e| StorageError::Archive(format!("Failed to extract {}: {}", slash_path, e)))?;

        produced.push(ProducedFile {
            relative: slash_path,
            size,
        });
    }

    Ok(produced)
}
