//! Input preprocessing: line splitting, NUL replacement, tab expansion.
//!
//! Lines are handed to the block parser already split and detabbed, so the
//! scanners never see a `\t` or a line terminator. Untouched lines are
//! borrowed from the input; only lines containing a NUL or a tab allocate.

use std::borrow::Cow;

use memchr::memchr2;

/// Tab stop width, in columns from the start of the line.
const TAB_STOP: usize = 4;

/// Split input on `\r\n`, `\n`, or `\r`, in any mixture.
///
/// A terminator ends a line; it does not start one, so input ending with a
/// terminator produces no trailing empty line.
pub fn split_lines(input: &str) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    while start < bytes.len() {
        match memchr2(b'\n', b'\r', &bytes[start..]) {
            Some(i) => {
                let end = start + i;
                lines.push(&input[start..end]);
                start = end + 1;
                if bytes[end] == b'\r' && bytes.get(start) == Some(&b'\n') {
                    start += 1;
                }
            }
            None => {
                lines.push(&input[start..]);
                break;
            }
        }
    }
    lines
}

/// Split `input` into lines ready for the block parser: terminators removed,
/// U+0000 replaced with U+FFFD, tabs expanded.
pub fn prepare(input: &str) -> Vec<Cow<'_, str>> {
    split_lines(input).into_iter().map(clean_line).collect()
}

fn clean_line(line: &str) -> Cow<'_, str> {
    let has_nul = line.contains('\0');
    let has_tab = line.contains('\t');
    if !has_nul && !has_tab {
        return Cow::Borrowed(line);
    }
    let mut cleaned = if has_nul {
        line.replace('\0', "\u{FFFD}")
    } else {
        line.to_string()
    };
    if has_tab {
        cleaned = detab(&cleaned).into_owned();
    }
    Cow::Owned(cleaned)
}

/// Expand tabs to spaces. Each tab advances to the next multiple of
/// `TAB_STOP` columns from the start of the line, so runs of tabs after
/// variable-width content expand by variable amounts.
pub fn detab(line: &str) -> Cow<'_, str> {
    if !line.contains('\t') {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len() + TAB_STOP * 2);
    let mut col = 0usize;
    for ch in line.chars() {
        if ch == '\t' {
            let spaces = TAB_STOP - col % TAB_STOP;
            for _ in 0..spaces {
                out.push(' ');
            }
            col += spaces;
        } else {
            out.push(ch);
            col += 1;
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        assert_eq!(split_lines("a\nb\nc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_trailing_newline_suppressed() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_split_single_newline() {
        assert_eq!(split_lines("\n"), vec![""]);
    }

    #[test]
    fn test_split_mixed_terminators() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_split_blank_lines_kept() {
        assert_eq!(split_lines("a\n\n\nb\n"), vec!["a", "", "", "b"]);
    }

    #[test]
    fn test_split_lone_cr() {
        assert_eq!(split_lines("a\r\rb"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_detab_start_of_line() {
        assert_eq!(detab("\tx"), "    x");
    }

    #[test]
    fn test_detab_mid_line() {
        assert_eq!(detab("ab\tc"), "ab  c");
    }

    #[test]
    fn test_detab_multiple_tabs() {
        // columns: "ab" -> 2, tab -> 4, "c" -> 5, tab -> 8
        assert_eq!(detab("ab\tc\td"), "ab  c   d");
    }

    #[test]
    fn test_detab_at_tab_stop() {
        assert_eq!(detab("abcd\te"), "abcd    e");
    }

    #[test]
    fn test_detab_idempotent() {
        let once = detab("\ta\tb").into_owned();
        assert_eq!(detab(&once), once);
    }

    #[test]
    fn test_detab_borrows_without_tabs() {
        assert!(matches!(detab("no tabs"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_prepare_replaces_nul() {
        let lines = prepare("a\0b\n");
        assert_eq!(lines[0], "a\u{FFFD}b");
    }

    #[test]
    fn test_prepare_nul_and_tab() {
        let lines = prepare("\t\0\n");
        assert_eq!(lines[0], "    \u{FFFD}");
    }
}
