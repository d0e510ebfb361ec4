//! Vantage Storage Library
//!
//! Filesystem layer for report bundles. Uploaded files land under
//! `{upload_root}/{company}/{report_title}/...`, and every path stored on a
//! report is `/`-separated and relative to the upload root.
//!
//! Reads go through the resolver, which rejects any request that would leave
//! the report's directory and tolerates Unicode normalization differences
//! between the stored names and the names referenced by report HTML.

pub mod content_type;
pub mod error;
pub mod ingest;
pub mod report_storage;
pub mod resolve;

pub use content_type::{content_type_for, is_html};
pub use error::{StorageError, StorageResult};
pub use ingest::{select_entry_point, IngestOutcome, UploadItem};
pub use report_storage::{report_dir_of, ByteStream, ReportStorage, ResolvedAsset};
