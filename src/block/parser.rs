//! The block parser state machine.
//!
//! Parsing is a left fold over preprocessed lines. Each line passes through
//! four phases: matching the stack of open containers from the root down
//! (continuation), breaking out of lists on a second blank line, opening new
//! containers at the deepest match, and attaching the remaining text to the
//! right block. Blocks finalize when a later line fails to continue them,
//! when a sibling or ancestor closes them, or at end of input.

use std::time::Instant;

use crate::inline::{InlineParser, RefScanner};
use crate::input;
use crate::limits;
use crate::refmap::RefMap;
use crate::scan;
use crate::tree::{CodeBlockData, ListData, NodeId, NodeValue, Pos, Tree, TreeWalker};
use crate::Options;

use super::Document;

const CODE_INDENT: usize = 4;

/// Per-type continuation behavior, extracted from a node for dispatch.
#[derive(Clone, Copy)]
enum ContRule {
    BlockQuote,
    Item { content_indent: usize },
    SingleLine,
    Fenced {
        fence_offset: usize,
        fence_char: u8,
        fence_length: usize,
    },
    Indented,
    Html,
    Paragraph,
    Container,
}

fn continuation_rule(value: &NodeValue) -> ContRule {
    match value {
        NodeValue::BlockQuote => ContRule::BlockQuote,
        NodeValue::Item(data) => ContRule::Item {
            content_indent: data.marker_offset + data.padding,
        },
        NodeValue::Heading { .. } | NodeValue::ThematicBreak => ContRule::SingleLine,
        NodeValue::CodeBlock(code) => {
            if code.fenced {
                ContRule::Fenced {
                    fence_offset: code.fence_offset,
                    fence_char: code.fence_char,
                    fence_length: code.fence_length,
                }
            } else {
                ContRule::Indented
            }
        }
        NodeValue::HtmlBlock { .. } => ContRule::Html,
        NodeValue::Paragraph => ContRule::Paragraph,
        NodeValue::Document | NodeValue::List(_) => ContRule::Container,
    }
}

/// Per-type finalization behavior.
#[derive(Clone, Copy)]
enum FinalizeKind {
    Paragraph,
    Heading,
    Html,
    FencedCode,
    IndentedCode,
    List,
    Other,
}

fn finalize_kind(value: &NodeValue) -> FinalizeKind {
    match value {
        NodeValue::Paragraph => FinalizeKind::Paragraph,
        NodeValue::Heading { .. } => FinalizeKind::Heading,
        NodeValue::HtmlBlock { .. } => FinalizeKind::Html,
        NodeValue::CodeBlock(code) => {
            if code.fenced {
                FinalizeKind::FencedCode
            } else {
                FinalizeKind::IndentedCode
            }
        }
        NodeValue::List(_) => FinalizeKind::List,
        _ => FinalizeKind::Other,
    }
}

fn lists_match(list: &ListData, item: &ListData) -> bool {
    list.list_type == item.list_type
        && list.delimiter == item.delimiter
        && list.bullet_char == item.bullet_char
}

/// The block parser. Owns the tree under construction and a cursor into it
/// (the tip: the deepest open block).
pub struct BlockParser<I = RefScanner> {
    tree: Tree,
    tip: NodeId,
    oldtip: NodeId,
    last_matched_container: NodeId,
    line_number: usize,
    last_line_length: usize,
    offset: usize,
    first_nonspace: usize,
    indent: usize,
    blank: bool,
    refmap: RefMap,
    options: Options,
    inlines: I,
}

impl BlockParser<RefScanner> {
    pub fn new() -> Self {
        Self::with_collaborator(RefScanner::new())
    }
}

impl Default for BlockParser<RefScanner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: InlineParser> BlockParser<I> {
    /// Create a parser with a custom inline collaborator.
    pub fn with_collaborator(inlines: I) -> Self {
        let tree = Tree::new();
        let root = tree.root();
        BlockParser {
            tree,
            tip: root,
            oldtip: root,
            last_matched_container: root,
            line_number: 0,
            last_line_length: 0,
            offset: 0,
            first_nonspace: 0,
            indent: 0,
            blank: false,
            refmap: RefMap::new(),
            options: Options::default(),
            inlines,
        }
    }

    /// Set parse options.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Parse `input` to completion and return the finished document.
    pub fn parse(mut self, input: &str) -> Document {
        let timing = self.options.time;

        let started = Instant::now();
        let lines = input::prepare(input);
        if timing {
            eprintln!("preparing input: {:.2?}", started.elapsed());
        }

        let started = Instant::now();
        for line in &lines {
            self.incorporate_line(line);
        }
        loop {
            let tip = self.tip;
            self.finalize(tip, self.line_number.max(1));
            if tip == self.tree.root() {
                break;
            }
        }
        if timing {
            eprintln!("block parsing: {:.2?}", started.elapsed());
        }

        let started = Instant::now();
        self.process_inlines();
        if timing {
            eprintln!("inline parsing: {:.2?}", started.elapsed());
        }

        Document {
            tree: self.tree,
            refmap: self.refmap,
        }
    }

    /// Process one line against the tree.
    fn incorporate_line(&mut self, line: &str) {
        let bytes = line.as_bytes();
        self.line_number += 1;
        self.offset = 0;
        self.blank = false;
        self.oldtip = self.tip;

        // Phase 1: match the open containers, root downward, against the
        // line. The walk never mutates the tree beyond blank-line flags.
        let mut all_matched = true;
        let mut container = self.tree.root();
        loop {
            let Some(last_child) = self.tree.last_child(container) else {
                break;
            };
            if !self.tree.node(last_child).open {
                break;
            }
            container = last_child;
            self.find_first_nonspace(bytes);

            match continuation_rule(&self.tree.node(container).value) {
                ContRule::BlockQuote => {
                    if self.indent <= 3 && bytes.get(self.first_nonspace) == Some(&b'>') {
                        self.offset = self.first_nonspace + 1;
                        if bytes.get(self.offset) == Some(&b' ') {
                            self.offset += 1;
                        }
                    } else {
                        all_matched = false;
                    }
                }
                ContRule::Item { content_indent } => {
                    if self.indent >= content_indent {
                        self.offset += content_indent;
                    } else if self.blank {
                        self.offset = self.first_nonspace;
                    } else {
                        all_matched = false;
                    }
                }
                ContRule::SingleLine => {
                    all_matched = false;
                    if self.blank {
                        self.tree.node_mut(container).last_line_blank = true;
                    }
                }
                ContRule::Fenced { fence_offset, .. } => {
                    let mut remaining = fence_offset;
                    while remaining > 0 && bytes.get(self.offset) == Some(&b' ') {
                        self.offset += 1;
                        remaining -= 1;
                    }
                }
                ContRule::Indented => {
                    if self.indent >= CODE_INDENT {
                        self.offset += CODE_INDENT;
                    } else if self.blank {
                        self.offset = self.first_nonspace;
                    } else {
                        all_matched = false;
                    }
                }
                ContRule::Html | ContRule::Paragraph => {
                    if self.blank {
                        self.tree.node_mut(container).last_line_blank = true;
                        all_matched = false;
                    }
                }
                ContRule::Container => {}
            }

            if !all_matched {
                container = self
                    .tree
                    .parent(container)
                    .expect("unmatched block has a parent");
                break;
            }
        }
        self.last_matched_container = container;

        // Phase 2: a second blank line in a row ends all containing lists.
        if self.blank && self.tree.node(container).last_line_blank {
            self.break_out_of_lists(container);
            container = self.tip;
        }

        // Phase 3: open new containers at the deepest match.
        loop {
            if matches!(
                self.tree.node(container).value,
                NodeValue::CodeBlock(_) | NodeValue::HtmlBlock { .. }
            ) {
                break;
            }
            if self.tree.depth(container) >= limits::MAX_BLOCK_NESTING {
                break;
            }
            match bytes.get(self.offset) {
                Some(&b) if scan::maybe_special(b) => {}
                _ => break,
            }
            self.find_first_nonspace(bytes);

            if self.indent >= CODE_INDENT {
                // indented code cannot interrupt a paragraph or start blank
                if !matches!(self.tree.node(self.tip).value, NodeValue::Paragraph) && !self.blank {
                    self.offset += CODE_INDENT;
                    self.close_unmatched_blocks();
                    let offset = self.offset;
                    container = self.add_child(NodeValue::CodeBlock(CodeBlockData::indented()), offset);
                }
                break;
            } else if bytes.get(self.first_nonspace) == Some(&b'>') {
                self.offset = self.first_nonspace + 1;
                if bytes.get(self.offset) == Some(&b' ') {
                    self.offset += 1;
                }
                self.close_unmatched_blocks();
                let offset = self.offset;
                container = self.add_child(NodeValue::BlockQuote, offset);
            } else if let Some((level, marker_len)) = scan::atx_heading(bytes, self.first_nonspace)
            {
                self.offset = self.first_nonspace + marker_len;
                self.close_unmatched_blocks();
                let start = self.first_nonspace;
                container = self.add_child(NodeValue::Heading { level }, start);
                let text = scan::strip_atx_closer(&line[self.offset..]).to_string();
                self.tree.node_mut(container).lines.push(text);
                break;
            } else if let Some((fence_char, fence_length)) =
                scan::open_fence(bytes, self.first_nonspace)
            {
                let fence_offset = self.first_nonspace - self.offset;
                self.close_unmatched_blocks();
                let start = self.first_nonspace;
                container = self.add_child(
                    NodeValue::CodeBlock(CodeBlockData::fenced(fence_char, fence_length, fence_offset)),
                    start,
                );
                self.offset = self.first_nonspace + fence_length;
                break;
            } else if scan::html_block_open(bytes, self.first_nonspace) {
                self.close_unmatched_blocks();
                let start = self.first_nonspace;
                container = self.add_child(NodeValue::HtmlBlock { literal: String::new() }, start);
                // offset stays before the indent: the whole line is raw text
                break;
            } else if let Some(level) = self.setext_level(container, bytes) {
                self.close_unmatched_blocks();
                self.tree.node_mut(container).value = NodeValue::Heading { level };
                self.offset = line.len();
            } else if scan::thematic_break(bytes, self.first_nonspace) {
                self.close_unmatched_blocks();
                let start = self.first_nonspace;
                container = self.add_child(NodeValue::ThematicBreak, start);
                self.offset = line.len().saturating_sub(1);
                break;
            } else if let Some(mut data) = scan::parse_list_marker(bytes, self.first_nonspace) {
                data.marker_offset = self.indent;
                self.offset = self.first_nonspace + data.padding;
                self.close_unmatched_blocks();
                let start = self.first_nonspace;
                let matches_open_list = match &self.tree.node(container).value {
                    NodeValue::List(list) => lists_match(list, &data),
                    _ => false,
                };
                if !matches_open_list {
                    container = self.add_child(NodeValue::List(data.clone()), start);
                }
                container = self.add_child(NodeValue::Item(data), start);
            } else {
                break;
            }

            if self.tree.node(container).value.accepts_lines() {
                break;
            }
        }

        // Phase 4: attach the line's text.
        self.find_first_nonspace(bytes);

        let lazy_continuation = self.tip != self.last_matched_container
            && !self.blank
            && matches!(self.tree.node(self.tip).value, NodeValue::Paragraph)
            && !self.tree.node(self.tip).lines.is_empty();
        if lazy_continuation {
            let offset = self.offset;
            self.add_line(line, offset);
        } else {
            self.close_unmatched_blocks();

            // Blockquote lines are never blank, since they begin with `>`;
            // blanks inside fenced code do not count for list tightness; an
            // item opened empty on this very line stays unblank.
            let empty_item_opened_now = matches!(self.tree.node(container).value, NodeValue::Item(_))
                && self.tree.first_child(container).is_none()
                && self.tree.node(container).sourcepos.start.line == self.line_number;
            let exempt = empty_item_opened_now
                || matches!(
                    self.tree.node(container).value,
                    NodeValue::BlockQuote | NodeValue::Heading { .. }
                )
                || matches!(&self.tree.node(container).value, NodeValue::CodeBlock(code) if code.fenced);
            self.tree.node_mut(container).last_line_blank = self.blank && !exempt;

            let mut ancestor = container;
            while let Some(parent) = self.tree.parent(ancestor) {
                self.tree.node_mut(parent).last_line_blank = false;
                ancestor = parent;
            }

            match continuation_rule(&self.tree.node(container).value) {
                ContRule::Indented | ContRule::Html => {
                    let offset = self.offset;
                    self.add_line(line, offset);
                }
                ContRule::Fenced {
                    fence_char,
                    fence_length,
                    ..
                } => {
                    let closed = self.indent <= 3
                        && scan::close_fence(bytes, self.first_nonspace, fence_char)
                            .is_some_and(|len| len >= fence_length);
                    if closed {
                        // the closing fence is not part of the literal
                        self.finalize(container, self.line_number);
                    } else {
                        let offset = self.offset;
                        self.add_line(line, offset);
                    }
                }
                ContRule::SingleLine => {}
                ContRule::Paragraph => {
                    let first_nonspace = self.first_nonspace;
                    self.add_line(line, first_nonspace);
                }
                ContRule::BlockQuote | ContRule::Item { .. } | ContRule::Container => {
                    if !self.blank {
                        let first_nonspace = self.first_nonspace;
                        self.add_child(NodeValue::Paragraph, first_nonspace);
                        self.add_line(line, first_nonspace);
                    }
                }
            }
        }

        self.last_line_length = line.len().saturating_sub(1);
    }

    /// Measure spaces, blankness, and indent from the current offset.
    fn find_first_nonspace(&mut self, bytes: &[u8]) {
        let mut i = self.offset.min(bytes.len());
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        self.first_nonspace = i;
        self.blank = i >= bytes.len();
        self.indent = self.first_nonspace.saturating_sub(self.offset);
    }

    /// Setext underline level, when `container` is a paragraph with exactly
    /// one collected line.
    fn setext_level(&self, container: NodeId, bytes: &[u8]) -> Option<u8> {
        let node = self.tree.node(container);
        if matches!(node.value, NodeValue::Paragraph) && node.lines.len() == 1 {
            scan::setext_underline(bytes, self.first_nonspace)
        } else {
            None
        }
    }

    /// Append the line from `offset` to the tip's collected lines.
    fn add_line(&mut self, line: &str, offset: usize) {
        let tip = self.tip;
        assert!(
            self.tree.node(tip).open,
            "line {} added to a closed block",
            self.line_number
        );
        let text = if offset >= line.len() { "" } else { &line[offset..] };
        self.tree.node_mut(tip).lines.push(text.to_string());
    }

    /// Open a new block as a child of the tip, finalizing blocks that cannot
    /// contain it first. The new block becomes the tip.
    fn add_child(&mut self, value: NodeValue, offset: usize) -> NodeId {
        while !self.tree.node(self.tip).value.can_contain(&value) {
            let tip = self.tip;
            assert!(
                tip != self.tree.root(),
                "no open container can hold the new block at line {}",
                self.line_number
            );
            self.finalize(tip, self.line_number - 1);
        }
        let child = self
            .tree
            .append_child(self.tip, value, Pos::new(self.line_number, offset + 1));
        self.tip = child;
        child
    }

    /// Finalize blocks that failed to match this line, from the old tip up
    /// to the last matched container.
    fn close_unmatched_blocks(&mut self) {
        while self.oldtip != self.last_matched_container {
            let unmatched = self.oldtip;
            let parent = self
                .tree
                .parent(unmatched)
                .expect("unmatched block has a parent");
            self.finalize(unmatched, self.line_number - 1);
            self.oldtip = parent;
        }
    }

    /// Two blank lines end all containing lists: finalize every block from
    /// `block` up through the outermost list and reset the tip above it.
    fn break_out_of_lists(&mut self, block: NodeId) {
        let mut probe = Some(block);
        let mut last_list = None;
        while let Some(node) = probe {
            if matches!(self.tree.node(node).value, NodeValue::List(_)) {
                last_list = Some(node);
            }
            probe = self.tree.parent(node);
        }
        let Some(list) = last_list else {
            return;
        };
        let mut current = block;
        while current != list {
            let parent = self.tree.parent(current).expect("list is an ancestor");
            self.finalize(current, self.line_number);
            current = parent;
        }
        self.finalize(list, self.line_number);
        self.tip = self.tree.parent(list).expect("list has a parent");
    }

    /// Close a block: stamp its end position, turn its collected lines into
    /// the per-type payload, and move the tip to its parent.
    fn finalize(&mut self, block: NodeId, line_number: usize) {
        if !self.tree.node(block).open {
            return;
        }
        let parent = self.tree.parent(block);
        {
            let node = self.tree.node_mut(block);
            node.open = false;
            node.sourcepos.end = Pos::new(line_number, self.last_line_length + 1);
        }
        let lines = std::mem::take(&mut self.tree.node_mut(block).lines);

        match finalize_kind(&self.tree.node(block).value) {
            FinalizeKind::Paragraph => {
                let mut content = lines.join("\n");
                let leading = content.len() - content.trim_start_matches(' ').len();
                if leading > 0 {
                    content.drain(..leading);
                }
                // link reference definitions peel off the front
                while content.starts_with('[') {
                    let consumed = self.inlines.parse_reference(&content, &mut self.refmap);
                    if consumed == 0 {
                        break;
                    }
                    content.drain(..consumed);
                }
                if scan::is_blank_text(&content) {
                    self.tree.unlink(block);
                }
                self.tree.node_mut(block).content = content;
            }
            FinalizeKind::Heading => {
                self.tree.node_mut(block).content = lines.join("\n");
            }
            FinalizeKind::Html => {
                let text = lines.join("\n");
                if let NodeValue::HtmlBlock { literal } = &mut self.tree.node_mut(block).value {
                    *literal = text;
                }
            }
            FinalizeKind::FencedCode => {
                // the first line is the info string
                let info = scan::unescape(lines.first().map(|s| s.trim()).unwrap_or(""));
                let literal = if lines.len() <= 1 {
                    String::new()
                } else {
                    let mut text = lines[1..].join("\n");
                    text.push('\n');
                    text
                };
                if let NodeValue::CodeBlock(code) = &mut self.tree.node_mut(block).value {
                    code.info = info;
                    code.literal = literal;
                }
            }
            FinalizeKind::IndentedCode => {
                let mut lines = lines;
                while lines.last().is_some_and(|l| l.bytes().all(|b| b == b' ')) {
                    lines.pop();
                }
                let mut literal = lines.join("\n");
                literal.push('\n');
                if let NodeValue::CodeBlock(code) = &mut self.tree.node_mut(block).value {
                    code.literal = literal;
                }
            }
            FinalizeKind::List => {
                let tight = self.list_is_tight(block);
                if let NodeValue::List(data) = &mut self.tree.node_mut(block).value {
                    data.tight = tight;
                }
            }
            FinalizeKind::Other => {}
        }

        self.tip = parent.unwrap_or(block);
    }

    /// A list is loose when an item or a sub-block with a following sibling
    /// ends with a blank line; otherwise tight.
    fn list_is_tight(&self, list: NodeId) -> bool {
        let mut item = self.tree.first_child(list);
        while let Some(current) = item {
            let last_item = self.tree.next_sibling(current).is_none();
            if self.ends_with_blank_line(current) && !last_item {
                return false;
            }
            let mut sub = self.tree.first_child(current);
            while let Some(block) = sub {
                let last_sub = self.tree.next_sibling(block).is_none();
                if self.ends_with_blank_line(block) && !(last_item && last_sub) {
                    return false;
                }
                sub = self.tree.next_sibling(block);
            }
            item = self.tree.next_sibling(current);
        }
        true
    }

    fn ends_with_blank_line(&self, node: NodeId) -> bool {
        if self.tree.node(node).last_line_blank {
            return true;
        }
        if matches!(
            self.tree.node(node).value,
            NodeValue::List(_) | NodeValue::Item(_)
        ) {
            if let Some(last) = self.tree.last_child(node) {
                return self.ends_with_blank_line(last);
            }
        }
        false
    }

    /// Hand every paragraph and heading to the inline collaborator, on the
    /// walker's leaving event so inline children never disturb the walk.
    fn process_inlines(&mut self) {
        let mut walker = TreeWalker::new(self.tree.root());
        while let Some(event) = walker.next(&self.tree) {
            if !event.entering
                && matches!(
                    self.tree.node(event.node).value,
                    NodeValue::Paragraph | NodeValue::Heading { .. }
                )
            {
                self.inlines.parse_inlines(&mut self.tree, event.node, &self.refmap);
            }
        }
    }
}
