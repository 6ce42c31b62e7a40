//! Parse collected response header lines.

/// Fields of one response header block that the downloader acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// Status code from the `HTTP/x y` line.
    pub status: Option<u32>,
    /// `Content-Length`, only when present and numeric.
    pub content_length: Option<u64>,
    /// `Location` value, if present.
    pub location: Option<String>,
}

impl ResponseHead {
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, Some(301 | 302 | 303 | 307 | 308))
    }
}

/// Parses the status line plus the headers of a single block.
pub fn parse_head(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head.status = parse_status_line(line);
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                // Non-numeric values are ignored; the streaming check still applies.
                head.content_length = value.parse::<u64>().ok();
            }
            if name.eq_ignore_ascii_case("location") && !value.is_empty() {
                head.location = Some(value.to_string());
            }
        }
    }

    head
}

/// `HTTP/1.1 404 Not Found` → 404; `HTTP/2 200` → 200.
pub fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn status_and_length() {
        let h = parse_head(&lines(&["HTTP/1.1 200 OK", "Content-Length: 12345", ""]));
        assert_eq!(h.status, Some(200));
        assert_eq!(h.content_length, Some(12345));
        assert!(h.location.is_none());
    }

    #[test]
    fn http2_status_line() {
        assert_eq!(parse_status_line("HTTP/2 404"), Some(404));
        assert_eq!(parse_status_line("HTTP/1.0 503 Service Unavailable"), Some(503));
        assert_eq!(parse_status_line("HTTP/1.1"), None);
    }

    #[test]
    fn non_numeric_length_is_ignored() {
        let h = parse_head(&lines(&["HTTP/1.1 200 OK", "content-length: lots"]));
        assert_eq!(h.status, Some(200));
        assert_eq!(h.content_length, None);
    }

    #[test]
    fn redirect_with_location() {
        let h = parse_head(&lines(&["HTTP/1.1 302 Found", "Location: /next/file.bin"]));
        assert!(h.is_redirect());
        assert_eq!(h.location.as_deref(), Some("/next/file.bin"));
    }

    #[test]
    fn not_modified_is_not_a_redirect() {
        let h = parse_head(&lines(&["HTTP/1.1 304 Not Modified", "Location: /x"]));
        assert!(!h.is_redirect());
    }
}
