//! Data models for the portal
//!
//! Each sub-module covers one domain entity together with its request DTOs.

mod activity;
mod caller;
mod company;
mod report;
mod user;

pub use activity::*;
pub use caller::*;
pub use company::*;
pub use report::*;
pub use user::*;
