pub mod activity;
pub mod auth;
pub mod client_reports;
pub mod companies;
pub mod dashboard;
pub mod report_files;
pub mod reports_admin;
pub mod users;
