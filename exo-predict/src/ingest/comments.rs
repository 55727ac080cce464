//! Comment-line removal
//!
//! Archive exports prefix the table with `#` metadata lines.

/// Remove every line whose first non-whitespace character is `#`
///
/// Remaining lines keep their original bytes, line endings and order.
pub fn strip_comments(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_leading_metadata() {
        let text = "# This file was produced by the archive\n#\nkepoi_name,koi_period\nK1,1.0\n";
        assert_eq!(strip_comments(text), "kepoi_name,koi_period\nK1,1.0\n");
    }

    #[test]
    fn test_indented_comment_is_stripped() {
        assert_eq!(strip_comments("  \t# note\na,b\n"), "a,b\n");
    }

    #[test]
    fn test_hash_inside_line_is_kept() {
        let text = "a,b\nK#1,2\n";
        assert_eq!(strip_comments(text), text);
    }

    #[test]
    fn test_preserves_crlf_and_missing_final_newline() {
        let text = "a,b\r\n# skip\r\n1,2";
        assert_eq!(strip_comments(text), "a,b\r\n1,2");
    }

    #[test]
    fn test_idempotent() {
        let text = "# one\nx,y\n # two\n1,2\n\n3,4";
        let once = strip_comments(text);
        assert_eq!(strip_comments(&once), once);
    }

    #[test]
    fn test_only_comments_yields_empty() {
        assert_eq!(strip_comments("# a\n# b\n"), "");
    }
}
