//! Basename extraction from URL path.

/// Returns the text after the final `/` of the URL path, or `None` if the
/// URL does not parse or the path has no basename (empty, root, or a
/// trailing slash).
pub fn basename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().rsplit('/').next()?;
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal() {
        assert_eq!(
            basename_from_url_path("https://example.com/a/b/file.deb").as_deref(),
            Some("file.deb")
        );
        assert_eq!(
            basename_from_url_path("https://example.com/single").as_deref(),
            Some("single")
        );
    }

    #[test]
    fn root_or_trailing_slash() {
        assert_eq!(basename_from_url_path("https://example.com/"), None);
        assert_eq!(basename_from_url_path("https://example.com"), None);
        assert_eq!(basename_from_url_path("https://example.com/a/b/"), None);
    }

    #[test]
    fn ignores_query_and_fragment() {
        assert_eq!(
            basename_from_url_path("https://example.com/file.zip?token=abc#frag").as_deref(),
            Some("file.zip")
        );
    }
}
