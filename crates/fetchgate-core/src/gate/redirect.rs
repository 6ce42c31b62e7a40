//! Redirect target resolution.

use url::Url;

use crate::error::FetchError;
use crate::url_model;

/// Resolves `location` against `current` and re-validates the result. A
/// target outside http/https is `InvalidUrl`.
pub fn next_hop(current: &Url, location: &str) -> Result<Url, FetchError> {
    let joined = current
        .join(location.trim())
        .map_err(|_| FetchError::InvalidUrl)?;
    url_model::parse_candidate(joined.as_str()).ok_or(FetchError::InvalidUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://files.example/dir/a.bin").unwrap()
    }

    #[test]
    fn absolute_location() {
        let next = next_hop(&base(), "https://cdn.example/x.bin").unwrap();
        assert_eq!(next.as_str(), "https://cdn.example/x.bin");
    }

    #[test]
    fn relative_location() {
        assert_eq!(
            next_hop(&base(), "/other/b.bin").unwrap().as_str(),
            "https://files.example/other/b.bin"
        );
        assert_eq!(
            next_hop(&base(), "c.bin").unwrap().as_str(),
            "https://files.example/dir/c.bin"
        );
    }

    #[test]
    fn scheme_relative_location() {
        assert_eq!(
            next_hop(&base(), "//127.0.0.1/x").unwrap().as_str(),
            "https://127.0.0.1/x"
        );
    }

    #[test]
    fn non_http_location_is_invalid() {
        assert!(matches!(
            next_hop(&base(), "file:///etc/passwd"),
            Err(FetchError::InvalidUrl)
        ));
        assert!(matches!(
            next_hop(&base(), "ftp://files.example/a"),
            Err(FetchError::InvalidUrl)
        ));
    }
}
