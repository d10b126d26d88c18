//! The inline collaborator seam.
//!
//! Block parsing depends on an inline parser for exactly two operations:
//! harvesting link reference definitions from paragraph heads as paragraphs
//! finalize, and parsing finalized paragraph/heading text into inline
//! children. [`InlineParser`] keeps that dependency injectable — tests can
//! pass a recording stub — and [`RefScanner`] is the bundled collaborator:
//! it implements the reference scanner and leaves inline content alone.

use crate::limits;
use crate::refmap::{RefMap, Reference};
use crate::scan;
use crate::tree::{NodeId, Tree};

/// The block parser's view of an inline parser.
pub trait InlineParser {
    /// Try to parse one link reference definition at the start of `text`.
    /// On success the definition is recorded in `refmap` and the number of
    /// bytes consumed is returned; 0 means no definition was found.
    fn parse_reference(&mut self, text: &str, refmap: &mut RefMap) -> usize;

    /// Parse `node`'s finalized content into inline children, consulting
    /// `refmap` for reference links. Invoked once per paragraph and heading
    /// after block parsing completes.
    fn parse_inlines(&mut self, tree: &mut Tree, node: NodeId, refmap: &RefMap);
}

/// Reference-definition scanner without an inline tokenizer.
///
/// `parse_inlines` is a no-op: block structure is this crate's product, and
/// paragraph/heading `content` is left intact for a downstream inline pass.
#[derive(Debug, Default)]
pub struct RefScanner;

impl RefScanner {
    pub fn new() -> Self {
        RefScanner
    }
}

impl InlineParser for RefScanner {
    fn parse_reference(&mut self, text: &str, refmap: &mut RefMap) -> usize {
        scan_reference(text, refmap)
    }

    fn parse_inlines(&mut self, _tree: &mut Tree, _node: NodeId, _refmap: &RefMap) {}
}

/// Parse one link reference definition at the start of `text`:
/// `[label]: destination "optional title"`, with the title allowed on the
/// following line. Returns bytes consumed, 0 if `text` does not begin with a
/// definition.
fn scan_reference(text: &str, refmap: &mut RefMap) -> usize {
    let bytes = text.as_bytes();

    let Some(label_end) = scan_link_label(bytes) else {
        return 0;
    };
    let raw_label = &text[1..label_end - 1];

    let mut pos = label_end;
    if bytes.get(pos) != Some(&b':') {
        return 0;
    }
    pos += 1;

    pos = spnl(bytes, pos);
    let Some(((dest_start, dest_end), after_dest)) = scan_destination(bytes, pos) else {
        return 0;
    };
    if dest_start == dest_end {
        return 0;
    }
    pos = after_dest;

    let before_title = pos;
    let title = match scan_title(bytes, spnl(bytes, pos)) {
        Some((title_start, title_end, after_title)) => {
            pos = after_title;
            Some((title_start, title_end))
        }
        None => {
            pos = before_title;
            None
        }
    };

    // nothing but spaces may follow on the line
    let mut end = pos;
    while bytes.get(end) == Some(&b' ') {
        end += 1;
    }
    match bytes.get(end) {
        None => {}
        Some(&b'\n') => end += 1,
        Some(_) => return 0,
    }

    let destination = scan::unescape(&text[dest_start..dest_end]);
    let title = match title {
        Some((title_start, title_end)) => scan::unescape(&text[title_start..title_end]),
        None => String::new(),
    };
    refmap.insert(raw_label, Reference { destination, title });
    end
}

/// `[` ... `]` with escapes and no unescaped inner brackets. The label must
/// contain at least one non-whitespace character. Returns the position just
/// past `]`.
fn scan_link_label(bytes: &[u8]) -> Option<usize> {
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let mut i = 1;
    let mut has_content = false;
    while i < bytes.len() && i <= limits::MAX_LINK_LABEL {
        match bytes[i] {
            b']' => return if has_content { Some(i + 1) } else { None },
            b'[' => return None,
            b'\\' => {
                has_content = true;
                i += 2;
            }
            b => {
                if !b.is_ascii_whitespace() {
                    has_content = true;
                }
                i += 1;
            }
        }
    }
    None
}

/// Spaces with at most one newline, as allowed between definition parts.
fn spnl(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos) == Some(&b' ') {
        pos += 1;
    }
    if bytes.get(pos) == Some(&b'\n') {
        pos += 1;
        while bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
    }
    pos
}

/// Link destination at `pos`: `<...>` (no newlines), or a bare run with
/// balanced single-level parentheses. Returns the destination span and the
/// position after it.
fn scan_destination(bytes: &[u8], pos: usize) -> Option<((usize, usize), usize)> {
    if bytes.get(pos) == Some(&b'<') {
        let start = pos + 1;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'>' => return Some(((start, i), i + 1)),
                b'\n' | b'<' => return None,
                b'\\' => i += if i + 1 < bytes.len() { 2 } else { 1 },
                _ => i += 1,
            }
        }
        None
    } else {
        let start = pos;
        let mut i = pos;
        let mut depth = 0usize;
        while i < bytes.len() {
            let b = bytes[i];
            match b {
                b'(' => {
                    depth += 1;
                    if depth > limits::MAX_LINK_PAREN_DEPTH {
                        return None;
                    }
                    i += 1;
                }
                b')' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    i += 1;
                }
                b'\\' => i += if i + 1 < bytes.len() { 2 } else { 1 },
                _ if b == b' ' || b == b'\n' || b.is_ascii_control() => break,
                _ => i += 1,
            }
        }
        if depth != 0 {
            return None;
        }
        Some(((start, i), i))
    }
}

/// Link title at `pos`: `"..."`, `'...'`, or `(...)`, escapes honored.
/// Returns the title span and the position after the closing delimiter.
fn scan_title(bytes: &[u8], pos: usize) -> Option<(usize, usize, usize)> {
    let close = match *bytes.get(pos)? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b if b == close => return Some((pos + 1, i, i + 1)),
            b'\\' => i += if i + 1 < bytes.len() { 2 } else { 1 },
            _ => i += 1,
        }
    }
    None
}
