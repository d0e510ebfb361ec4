//! Filename and upload validation helpers

/// Extensions accepted for uploaded items when `ALLOWED_FILE_TYPES` is unset
pub const DEFAULT_ALLOWED_FILE_TYPES: &[&str] = &[
    "html", "pdf", "png", "jpg", "jpeg", "gif", "csv", "xlsx", "docx", "zip",
];

const UNNAMED_FILE: &str = "unnamed_file";

/// Make a single path segment safe for storage.
///
/// Characters `< > : " / \ | ? *` and ASCII control characters become `_`,
/// leading/trailing dots and spaces are stripped, and an empty result becomes
/// `unnamed_file`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_ascii_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');
    if trimmed.is_empty() {
        UNNAMED_FILE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lowercased text after the last `.`; a name without `.` yields the whole name.
pub fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => name.to_lowercase(),
    }
}

pub fn is_allowed_file_type(name: &str, allowed: &[String]) -> bool {
    let ext = file_extension(name);
    allowed.iter().any(|a| a == &ext)
}

/// Human readable size: `0 B`, otherwise one decimal over B/KB/MB/GB/TB.
pub fn format_file_size(size_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if size_bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, UNITS[unit])
}
