//! Rewrites relative `src`/`href` references in report HTML so sub-resource
//! requests carry the viewing capability token.

use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};

/// Attribute with a double- or single-quoted value. Unterminated values never
/// match and are left as they are.
static LINK_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(src|href)(\s*=\s*)(?:"([^"<>]*)"|'([^'<>]*)')"#)
        .unwrap_or_else(|e| panic!("invalid link attribute pattern: {}", e))
});

/// Everything except RFC 3986 unreserved characters
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const UNTOUCHED_PREFIXES: [&str; 7] = [
    "http://",
    "https://",
    "data:",
    "#",
    "javascript:",
    "mailto:",
    "//",
];

fn is_untouched(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    UNTOUCHED_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Append the token query parameter, keeping any `#fragment` last
fn with_token(value: &str, encoded_token: &str) -> String {
    let (target, fragment) = match value.find('#') {
        Some(i) => value.split_at(i),
        None => (value, ""),
    };
    let separator = if target.contains('?') { '&' } else { '?' };
    format!("{}{}token={}{}", target, separator, encoded_token, fragment)
}

/// Return `html` with every relative `src`/`href` value extended with the token.
pub fn rewrite(html: &str, token: &str) -> String {
    let encoded_token = utf8_percent_encode(token, QUERY_VALUE).to_string();

    LINK_ATTRIBUTE
        .replace_all(html, |caps: &Captures| {
            let (value, quote) = match (caps.get(3), caps.get(4)) {
                (Some(v), _) => (v.as_str(), '"'),
                (None, Some(v)) => (v.as_str(), '\''),
                (None, None) => return caps[0].to_string(),
            };

            if is_untouched(value) {
                return caps[0].to_string();
            }

            format!(
                "{}{}{quote}{}{quote}",
                &caps[1],
                &caps[2],
                with_token(value, &encoded_token)
            )
        })
        .into_owned()
}
