//! Vantage persistence layer
//!
//! Store traits for companies, users, reports and activity logs, with a
//! PostgreSQL implementation (sqlx) and an in-memory implementation used for
//! local runs and tests.

pub mod db;

pub use db::*;
