//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Case-insensitive ASCII prefix strip. Returns the remainder after the
/// prefix, or `None` if `s` does not start with it.
pub fn strip_prefix_ignore_ascii_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // each kana is 3 bytes
        assert_eq!(truncate("あいうえお", 15), "あいうえお");
        assert_eq!(truncate("あいうえお", 12), "あいう...");
    }

    #[test]
    fn test_strip_prefix_ignore_case() {
        assert_eq!(
            strip_prefix_ignore_ascii_case("Internal Server Error: boom", "internal server error:"),
            Some(" boom")
        );
        assert_eq!(strip_prefix_ignore_ascii_case("boom", "error:"), None);
        // prefix length lands inside a multi-byte char
        assert_eq!(strip_prefix_ignore_ascii_case("あい", "ab"), None);
    }
}
