use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use vantage_core::validation::{file_extension, is_allowed_file_type, sanitize_filename};

use crate::content_type::content_type_for;
use crate::error::{StorageError, StorageResult};
use crate::ingest::{expand_zip, partition, IngestOutcome, ProducedFile, UploadItem};
use crate::resolve::{lexical_guard, resolve_within};

/// Stream of file chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// A file located by the resolver
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    /// Canonical absolute path
    pub path: PathBuf,
    pub content_type: &'static str,
    pub size: u64,
}

/// Filesystem storage for report bundles
#[derive(Debug, Clone)]
pub struct ReportStorage {
    root: PathBuf,
}

impl ReportStorage {
    /// Create the upload root if needed
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create upload directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(ReportStorage { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Write an upload into `{root}/{company}/{title}`.
    ///
    /// Every item's extension is checked before anything is written; one
    /// disallowed item fails the whole upload. Zip items are expanded in place
    /// and removed; a zip that cannot be expanded is kept as an opaque file.
    #[tracing::instrument(skip(self, items, allowed_types), fields(item_count = items.len()))]
    pub async fn ingest(
        &self,
        company_name: &str,
        title: &str,
        items: Vec<UploadItem>,
        allowed_types: &[String],
    ) -> StorageResult<IngestOutcome> {
        let items: Vec<UploadItem> = items
            .into_iter()
            .filter(|item| !item.filename.is_empty())
            .collect();

        if let Some(rejected) = items
            .iter()
            .find(|item| !is_allowed_file_type(&item.filename, allowed_types))
        {
            return Err(StorageError::DisallowedType(rejected.filename.clone()));
        }

        let start = std::time::Instant::now();
        let directory = format!("{}/{}", sanitize_filename(company_name), sanitize_filename(title));
        let dest = self.root.join(sanitize_filename(company_name)).join(sanitize_filename(title));
        fs::create_dir_all(&dest).await?;

        let mut produced: Vec<ProducedFile> = Vec::new();
        for item in items {
            let name = sanitize_filename(&item.filename);
            let path = dest.join(&name);
            self.write_file(&path, &item.data).await?;

            if file_extension(&name) != "zip" {
                produced.push(ProducedFile {
                    relative: name,
                    size: item.data.len() as u64,
                });
                continue;
            }

            let (zip_path, zip_dest) = (path.clone(), dest.clone());
            let expanded = tokio::task::spawn_blocking(move || expand_zip(&zip_path, &zip_dest))
                .await
                .unwrap_or_else(|e| Err(StorageError::Archive(format!("Extraction task failed: {}", e))));

            match expanded {
                Ok(members) => {
                    tracing::debug!(archive = %name, members = members.len(), "Expanded zip archive");
                    fs::remove_file(&path).await?;
                    produced.extend(members);
                }
                Err(e) => {
                    tracing::warn!(archive = %name, error = %e, "Keeping zip that could not be expanded");
                    produced.push(ProducedFile {
                        relative: name,
                        size: item.data.len() as u64,
                    });
                }
            }
        }

        let total_size = produced.iter().map(|f| f.size).sum();
        let paths = produced
            .into_iter()
            .map(|f| format!("{}/{}", directory, f.relative))
            .collect();
        let (entry_point, supporting_files) = partition(paths);

        tracing::info!(
            directory = %directory,
            entry_point = %entry_point,
            supporting = supporting_files.len(),
            size_bytes = total_size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Report files stored"
        );

        Ok(IngestOutcome {
            directory,
            entry_point,
            supporting_files,
            total_size,
        })
    }

    /// Directory that relative asset requests of a report resolve against:
    /// the directory holding its entry point.
    fn report_dir(&self, entry_point: &str) -> StorageResult<PathBuf> {
        if entry_point.is_empty() {
            return Err(StorageError::NotFound("Report has no entry point".to_string()));
        }

        let dir = entry_point.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        Ok(self.root.join(lexical_guard(dir)?))
    }

    async fn describe(path: PathBuf) -> StorageResult<ResolvedAsset> {
        let size = fs::metadata(&path).await?.len();
        Ok(ResolvedAsset {
            content_type: content_type_for(&path),
            path,
            size,
        })
    }

    /// Resolve a path requested relative to the report's entry-point directory
    pub async fn resolve_asset(
        &self,
        entry_point: &str,
        requested: &str,
    ) -> StorageResult<ResolvedAsset> {
        let report_dir = self.report_dir(entry_point)?;
        let path = resolve_within(&report_dir, requested).await?;
        Self::describe(path).await
    }

    /// Resolve a path recorded on a report (relative to the upload root)
    pub async fn resolve_stored(&self, relative: &str) -> StorageResult<ResolvedAsset> {
        let path = resolve_within(&self.root, relative).await?;
        Self::describe(path).await
    }

    pub async fn read(&self, asset: &ResolvedAsset) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();
        let data = fs::read(&asset.path).await?;

        tracing::debug!(
            path = %asset.path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Report file read"
        );

        Ok(data)
    }

    pub async fn open_stream(&self, asset: &ResolvedAsset) -> StorageResult<ByteStream> {
        let file = fs::File::open(&asset.path).await?;
        let path_display = asset.path.display().to_string();

        let stream = tokio_util::io::ReaderStream::new(file).map(move |chunk| {
            chunk.map_err(|e| {
                tracing::error!(path = %path_display, error = %e, "Report file stream error");
                StorageError::IoError(e)
            })
        });

        Ok(Box::pin(stream))
    }

    /// Remove the `{company}/{title}` directory holding `relative_file`.
    /// The company directory is removed too once it is empty.
    pub async fn remove_report_dir(&self, relative_file: &str) -> StorageResult<()> {
        let Some((company, title)) = report_dir_segments(relative_file) else {
            return Ok(());
        };

        let company_dir = self.root.join(lexical_guard(company)?);
        let report_dir = company_dir.join(lexical_guard(title)?);

        if fs::try_exists(&report_dir).await.unwrap_or(false) {
            fs::remove_dir_all(&report_dir).await?;
            tracing::info!(path = %report_dir.display(), "Report directory removed");
        }

        // Fails while other reports of the company remain
        let _ = fs::remove_dir(&company_dir).await;
        Ok(())
    }
}

fn report_dir_segments(relative_file: &str) -> Option<(&str, &str)> {
    let mut segments = relative_file.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next(), segments.next()) {
        (Some(company), Some(title), Some(_)) => Some((company, title)),
        _ => None,
    }
}

/// The `{company}/{title}` directory a stored file lives in, relative to the
/// upload root. Distinct company names can sanitize to the same directory.
pub fn report_dir_of(relative_file: &str) -> Option<String> {
    report_dir_segments(relative_file).map(|(company, title)| format!("{}/{}", company, title))
}
