//! URL validation, host extraction and filename derivation.
//!
//! Everything here is pure: no DNS, no sockets. The gate calls these before
//! any network access so malformed input is rejected for free.

mod path;
mod sanitize;

pub use path::basename_from_url_path;
pub use sanitize::sanitize_filename_for_linux;

use url::{Host, Url};

/// Filename offered when the URL path has no usable basename.
pub const DEFAULT_FILENAME: &str = "file";

/// Returns true iff `url` parses with an `http`/`https` scheme and a
/// non-empty host. Never panics; anything malformed is simply rejected.
pub fn validate(url: &str) -> bool {
    parse_candidate(url).is_some()
}

/// Parses `url` and returns it only when it passes [`validate`].
pub fn parse_candidate(url: &str) -> Option<Url> {
    if !has_authority(url) {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    match parsed.host()? {
        Host::Domain(d) if d.is_empty() => None,
        _ => Some(parsed),
    }
}

/// True when the text after `scheme:` starts with `//`. The WHATWG parser
/// invents an authority for `http:host/x`, `http:/host/x` and `http:\\host\x`;
/// those inputs carry none and are rejected.
fn has_authority(url: &str) -> bool {
    match url.trim().split_once(':') {
        Some((_, rest)) => rest.starts_with("//"),
        None => false,
    }
}

/// Host of a validated URL as used for resolution: domain names as-is
/// (lowercased, punycode), IP literals without brackets.
pub fn host_of(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(d) => Some(d.to_string()),
        Host::Ipv4(v4) => Some(v4.to_string()),
        Host::Ipv6(v6) => Some(v6.to_string()),
    }
}

/// Explicit port, or the scheme default (80/443).
pub fn port_of(url: &Url) -> u16 {
    url.port_or_known_default().unwrap_or(80)
}

/// Filename suggested to the recipient of a download.
///
/// Uses the basename of the URL path, sanitized for Linux. Falls back to
/// [`DEFAULT_FILENAME`] when the path ends in `/`, is empty, or sanitizes to
/// nothing.
///
/// # Examples
///
/// - `suggested_filename("https://example.com/a.txt")` → `"a.txt"`
/// - `suggested_filename("https://example.com/dir/")` → `"file"`
pub fn suggested_filename(url: &str) -> String {
    let raw = match basename_from_url_path(url) {
        Some(b) => b,
        None => return DEFAULT_FILENAME.to_string(),
    };

    let sanitized = sanitize_filename_for_linux(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}
