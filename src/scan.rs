//! Line scanners: byte-level recognizers for block markers.
//!
//! All scanners operate on a single preprocessed line (no tabs, no
//! terminator) at a byte offset and allocate nothing. They decide whether a
//! marker is present; the block parser decides what to do about it.

use memchr::memchr;

use crate::limits;
use crate::tree::{ListData, ListDelim, ListType};

/// Fast gate for the opening phase: a byte that could begin a new block
/// (or a space, which may hide an indented code block).
#[inline]
pub fn maybe_special(byte: u8) -> bool {
    matches!(
        byte,
        b' ' | b'#' | b'`' | b'~' | b'*' | b'+' | b'_' | b'=' | b'<' | b'>' | b'-'
    ) || byte.is_ascii_digit()
}

/// ATX heading marker at `pos`: 1-6 `#` followed by a space or end of line.
/// Returns the level and the bytes consumed (marker plus following spaces).
pub fn atx_heading(line: &[u8], pos: usize) -> Option<(u8, usize)> {
    let mut i = pos;
    while i < line.len() && line[i] == b'#' {
        i += 1;
    }
    let level = i - pos;
    if level == 0 || level > 6 {
        return None;
    }
    if i < line.len() && line[i] != b' ' {
        return None;
    }
    while i < line.len() && line[i] == b' ' {
        i += 1;
    }
    Some((level as u8, i - pos))
}

/// Strip a heading's trailing `#` run and surrounding spaces, keeping a
/// backslash-escaped final hash.
pub fn strip_atx_closer(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b' ' {
        end -= 1;
    }
    let hash_end = end;
    while end > 0 && bytes[end - 1] == b'#' {
        end -= 1;
    }
    if end < hash_end {
        if end > 0 && bytes[end - 1] == b'\\' {
            end += 1;
        } else {
            while end > 0 && bytes[end - 1] == b' ' {
                end -= 1;
            }
        }
    }
    &text[..end]
}

/// Opening code fence at `pos`: at least three backticks with no later
/// backtick on the line, or at least three tildes with no later tilde.
/// Returns the fence character and length.
pub fn open_fence(line: &[u8], pos: usize) -> Option<(u8, usize)> {
    let ch = *line.get(pos)?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let mut i = pos;
    while i < line.len() && line[i] == ch {
        i += 1;
    }
    let len = i - pos;
    if len < 3 {
        return None;
    }
    if memchr(ch, &line[i..]).is_some() {
        return None;
    }
    Some((ch, len))
}

/// Closing fence at `pos`: a run of at least three `fence_char` followed
/// only by spaces. Returns the run length; the caller compares it against
/// the opening fence.
pub fn close_fence(line: &[u8], pos: usize, fence_char: u8) -> Option<usize> {
    if line.get(pos) != Some(&fence_char) {
        return None;
    }
    let mut i = pos;
    while i < line.len() && line[i] == fence_char {
        i += 1;
    }
    let len = i - pos;
    if len < 3 {
        return None;
    }
    if line[i..].iter().all(|&b| b == b' ') {
        Some(len)
    } else {
        None
    }
}

/// Setext underline at `pos`: a run of `=` (level 1) or `-` (level 2)
/// trailed only by spaces. Valid only against a single-line paragraph,
/// which is the caller's check.
pub fn setext_underline(line: &[u8], pos: usize) -> Option<u8> {
    let ch = *line.get(pos)?;
    let level = match ch {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let mut i = pos;
    while i < line.len() && line[i] == ch {
        i += 1;
    }
    if line[i..].iter().all(|&b| b == b' ') {
        Some(level)
    } else {
        None
    }
}

/// Thematic break at `pos`: three or more of the same `*`, `_`, or `-`,
/// separated only by spaces, to the end of the line.
pub fn thematic_break(line: &[u8], pos: usize) -> bool {
    let marker = match line.get(pos) {
        Some(&c) if matches!(c, b'*' | b'_' | b'-') => c,
        _ => return false,
    };
    let mut count = 0;
    for &b in &line[pos..] {
        if b == marker {
            count += 1;
        } else if b != b' ' {
            return false;
        }
    }
    count >= 3
}

/// List marker at `pos`: a bullet (`*`, `+`, `-`) or an ordered marker
/// (digits then `.` or `)`), followed by at least one space or end of line.
/// Lines that scan as a thematic break are not markers. `padding` is set;
/// `marker_offset` is the caller's.
pub fn parse_list_marker(line: &[u8], pos: usize) -> Option<ListData> {
    if thematic_break(line, pos) {
        return None;
    }
    let rest = &line[pos..];
    let first = *rest.first()?;

    let (mut data, marker_len, spaces_after) = if matches!(first, b'*' | b'+' | b'-') {
        let mut i = 1;
        while i < rest.len() && rest[i] == b' ' {
            i += 1;
        }
        let spaces = i - 1;
        if spaces == 0 && i < rest.len() {
            return None;
        }
        let data = ListData {
            list_type: ListType::Bullet,
            bullet_char: first,
            start: 0,
            delimiter: ListDelim::Period,
            padding: 0,
            marker_offset: 0,
            tight: true,
        };
        (data, i, spaces)
    } else if first.is_ascii_digit() {
        let mut digits = 0;
        while digits < rest.len() && rest[digits].is_ascii_digit() {
            digits += 1;
        }
        if digits > limits::MAX_LIST_MARKER_DIGITS {
            return None;
        }
        let delimiter = match rest.get(digits) {
            Some(b'.') => ListDelim::Period,
            Some(b')') => ListDelim::Paren,
            _ => return None,
        };
        let mut start = 0usize;
        for &b in &rest[..digits] {
            start = start * 10 + (b - b'0') as usize;
        }
        let mut i = digits + 1;
        while i < rest.len() && rest[i] == b' ' {
            i += 1;
        }
        let spaces = i - (digits + 1);
        if spaces == 0 && i < rest.len() {
            return None;
        }
        let data = ListData {
            list_type: ListType::Ordered,
            bullet_char: 0,
            start,
            delimiter,
            padding: 0,
            marker_offset: 0,
            tight: true,
        };
        (data, i, spaces)
    } else {
        return None;
    };

    let blank_item = marker_len == rest.len();
    data.padding = if !(1..5).contains(&spaces_after) || blank_item {
        marker_len - spaces_after + 1
    } else {
        marker_len
    };
    Some(data)
}

/// The fixed set of tag names that open an HTML block, sorted for binary
/// search.
const HTML_BLOCK_TAGS: &[&[u8]] = &[
    b"article",
    b"aside",
    b"blockquote",
    b"body",
    b"button",
    b"canvas",
    b"caption",
    b"col",
    b"colgroup",
    b"dd",
    b"div",
    b"dl",
    b"dt",
    b"embed",
    b"fieldset",
    b"figcaption",
    b"figure",
    b"footer",
    b"form",
    b"h1",
    b"h2",
    b"h3",
    b"h4",
    b"h5",
    b"h6",
    b"header",
    b"hgroup",
    b"hr",
    b"iframe",
    b"li",
    b"map",
    b"object",
    b"ol",
    b"output",
    b"p",
    b"pre",
    b"progress",
    b"script",
    b"section",
    b"style",
    b"table",
    b"tbody",
    b"td",
    b"textarea",
    b"tfoot",
    b"th",
    b"thead",
    b"tr",
    b"ul",
    b"video",
];

/// Longest name in `HTML_BLOCK_TAGS`.
const MAX_TAG_LEN: usize = 10;

/// HTML block opener at `pos`: `<` plus a known block tag name and a
/// terminator, `</` plus the same, or `<?`/`<!`. Tag names match
/// case-insensitively.
pub fn html_block_open(line: &[u8], pos: usize) -> bool {
    if line.get(pos) != Some(&b'<') {
        return false;
    }
    let mut i = pos + 1;
    match line.get(i) {
        Some(b'?') | Some(b'!') => return true,
        _ => {}
    }
    let closing = line.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }
    let name_start = i;
    while i < line.len() && line[i].is_ascii_alphanumeric() {
        i += 1;
    }
    let name_len = i - name_start;
    if name_len == 0 || name_len > MAX_TAG_LEN {
        return false;
    }
    let mut name = [0u8; MAX_TAG_LEN];
    for (slot, &b) in name.iter_mut().zip(&line[name_start..i]) {
        *slot = b.to_ascii_lowercase();
    }
    if HTML_BLOCK_TAGS.binary_search(&&name[..name_len]).is_err() {
        return false;
    }
    match line.get(i) {
        Some(b' ') | Some(b'\t') | Some(b'>') => true,
        Some(b'/') => !closing,
        _ => false,
    }
}

/// Remove backslash escapes before ASCII punctuation.
pub fn unescape(text: &str) -> String {
    if !text.contains('\\') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_punctuation() {
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

/// Whether `text` contains nothing but whitespace.
pub fn is_blank_text(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}
