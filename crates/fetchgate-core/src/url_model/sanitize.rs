//! Linux-safe filename sanitization.

/// Longest filename Linux accepts, in bytes.
const NAME_MAX: usize = 255;

/// Makes a URL-derived name safe to create on Linux.
///
/// Separators, NUL, whitespace and control characters become `_`, runs of
/// `_` collapse to one, leading/trailing spaces, dots and underscores are
/// stripped, and the result is cut to `NAME_MAX` bytes on a char boundary.
/// May return an empty string; callers supply the fallback name.
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches(|c| c == ' ' || c == '.' || c == '_');
    truncate_bytes(trimmed, NAME_MAX).to_string()
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\0' | '/' | '\\') || c.is_control() || c.is_whitespace()
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    let end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= max)
        .last()
        .unwrap_or(0);
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_separators() {
        assert_eq!(sanitize_filename_for_linux("a/b\\c.txt"), "a_b_c.txt");
    }

    #[test]
    fn trims_dots_and_spaces() {
        assert_eq!(sanitize_filename_for_linux("  ..  file.txt  ..  "), "file.txt");
    }

    #[test]
    fn collapses_underscores() {
        assert_eq!(sanitize_filename_for_linux("file___name.txt"), "file_name.txt");
    }

    #[test]
    fn control_chars() {
        assert_eq!(sanitize_filename_for_linux("file\x00na\x1bme.txt"), "file_na_me.txt");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_filename_for_linux(&long);
        assert!(out.len() <= 255);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
