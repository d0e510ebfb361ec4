//! Vantage services
//!
//! Business logic between the HTTP surface and the stores: report ingestion,
//! viewing capabilities, link rewriting, access policy, file serving, activity
//! logging, notifications and company lifecycle.

pub mod activity;
pub mod assets;
pub mod capability;
pub mod company;
pub mod ingest;
pub mod notify;
pub mod policy;
pub mod rewrite;

pub use activity::ActivityLogger;
pub use assets::{AssetBody, AssetService, ClientContext, SecureViewToken, ServedAsset};
pub use capability::{CapabilityGrant, CapabilityStore, InMemoryCapabilityStore};
pub use company::CompanyService;
pub use ingest::{IngestService, UploadRequest, UploadSummary};
pub use notify::{NoopNotifier, Notifier, Recipient, ReportNotice, SmtpNotifier};
