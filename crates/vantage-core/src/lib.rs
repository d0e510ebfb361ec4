//! Vantage Core Library
//!
//! Domain models, error types, configuration and validation helpers shared by
//! every Vantage crate.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

pub use config::{BaseConfig, Config, PortalConfig, StoreBackend, CAPABILITY_TOKEN_TTL_SECS};
pub use error::{AppError, ErrorMetadata, LogLevel};
