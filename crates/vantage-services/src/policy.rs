//! Report access policy.
//!
//! Visibility failures are reported as `NotFound` so a cross-tenant report is
//! indistinguishable from a missing one.

use vantage_core::models::{Caller, Report};
use vantage_core::AppError;

/// Admins see every published report, clients only their company's.
pub fn can_view(caller: &Caller, report: &Report) -> bool {
    report.is_published() && (caller.is_admin() || caller.company_id == report.company_id)
}

pub fn authorize_view(caller: &Caller, report: &Report) -> Result<(), AppError> {
    if can_view(caller, report) {
        Ok(())
    } else {
        Err(AppError::NotFound("Report not found".to_string()))
    }
}

/// Whether the caller may download from the report (admins bypass the flag)
pub fn effective_allow_download(caller: &Caller, report: &Report) -> bool {
    caller.is_admin() || report.allow_download
}

pub fn authorize_download(caller: &Caller, report: &Report) -> Result<(), AppError> {
    authorize_view(caller, report)?;
    if !effective_allow_download(caller, report) {
        return Err(AppError::Forbidden(
            "Download not allowed for this report".to_string(),
        ));
    }
    Ok(())
}

/// The requested path must be one of the report's recorded files
pub fn authorize_file(report: &Report, file_path: &str) -> Result<(), AppError> {
    if file_path.is_empty() || !report.contains_file(file_path) {
        return Err(AppError::Forbidden(
            "File does not belong to this report".to_string(),
        ));
    }
    Ok(())
}
