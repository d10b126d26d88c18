//! The block node tree.
//!
//! Nodes live in an arena owned by the tree and are addressed by [`NodeId`],
//! a `u32` index. Parent, child, and sibling links are plain ids, so the
//! tree has no reference cycles and cursors into it (the parser's tip, a
//! walker's position) are cheap copies.

use std::fmt;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

// Compile-time size verification
const _: () = assert!(std::mem::size_of::<NodeId>() == 4);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    #[inline]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Inclusive source span of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sourcepos {
    pub start: Pos,
    pub end: Pos,
}

impl fmt::Display for Sourcepos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.col, self.end.line, self.end.col
        )
    }
}

/// Kind of list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Bullet,
    Ordered,
}

/// Delimiter after an ordered list marker's digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDelim {
    Period,
    Paren,
}

/// Marker data shared by a list and its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListData {
    pub list_type: ListType,
    /// Bullet character (`*`, `+`, or `-`); 0 for ordered lists.
    pub bullet_char: u8,
    /// Starting number of an ordered list; 0 for bullet lists.
    pub start: usize,
    pub delimiter: ListDelim,
    /// Columns from the marker start to the item's content.
    pub padding: usize,
    /// Indentation of the marker within its container.
    pub marker_offset: usize,
    /// Computed when the list finalizes; items keep their creation-time copy.
    pub tight: bool,
}

/// Payload of a code block, fenced or indented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockData {
    pub fenced: bool,
    /// Fence character (`` ` `` or `~`); 0 when indented.
    pub fence_char: u8,
    /// Length of the opening fence; 0 when indented.
    pub fence_length: usize,
    /// Indentation of the opening fence, stripped from continuation lines.
    pub fence_offset: usize,
    /// Trimmed, backslash-unescaped info string.
    pub info: String,
    pub literal: String,
}

impl CodeBlockData {
    pub fn indented() -> Self {
        CodeBlockData {
            fenced: false,
            fence_char: 0,
            fence_length: 0,
            fence_offset: 0,
            info: String::new(),
            literal: String::new(),
        }
    }

    pub fn fenced(fence_char: u8, fence_length: usize, fence_offset: usize) -> Self {
        CodeBlockData {
            fenced: true,
            fence_char,
            fence_length,
            fence_offset,
            info: String::new(),
            literal: String::new(),
        }
    }
}

/// The tagged payload of a block node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    /// The root. Contains any block except items.
    Document,
    /// A block quote. Contains any block except items.
    BlockQuote,
    /// A list. Contains only items.
    List(ListData),
    /// A list item. Contains any block except items.
    Item(ListData),
    /// A paragraph leaf; finalized text lands in [`NodeData::content`].
    Paragraph,
    /// An ATX or setext heading leaf.
    Heading { level: u8 },
    /// A thematic break leaf. No payload.
    ThematicBreak,
    /// A fenced or indented code block leaf.
    CodeBlock(CodeBlockData),
    /// A raw HTML block leaf.
    HtmlBlock { literal: String },
}

impl NodeValue {
    /// Whether this block may hold `child` as a direct child.
    pub fn can_contain(&self, child: &NodeValue) -> bool {
        match self {
            NodeValue::Document | NodeValue::BlockQuote | NodeValue::Item(_) => {
                !matches!(child, NodeValue::Item(_))
            }
            NodeValue::List(_) => matches!(child, NodeValue::Item(_)),
            _ => false,
        }
    }

    /// Whether this block collects raw lines while open.
    pub fn accepts_lines(&self) -> bool {
        matches!(
            self,
            NodeValue::Paragraph | NodeValue::CodeBlock(_) | NodeValue::HtmlBlock { .. }
        )
    }
}

/// A node's state and links.
#[derive(Debug)]
pub struct NodeData {
    pub value: NodeValue,
    /// Whether the block still accepts lines and children. Cleared exactly
    /// once, at finalization.
    pub open: bool,
    /// Whether the last line touched by this block was blank. Drives list
    /// tightness and the two-blank-line list break.
    pub last_line_blank: bool,
    pub sourcepos: Sourcepos,
    /// Finalized text of a paragraph or heading.
    pub content: String,
    /// Raw line fragments collected while open; drained at finalization.
    pub(crate) lines: Vec<String>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// An arena-backed block tree rooted at a `Document` node.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    /// Create a tree containing an open `Document` root.
    pub fn new() -> Self {
        let mut tree = Tree { nodes: Vec::new() };
        tree.alloc(NodeValue::Document, Pos::new(1, 1));
        tree
    }

    fn alloc(&mut self, value: NodeValue, start: Pos) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            value,
            open: true,
            last_line_blank: false,
            sourcepos: Sourcepos { start, end: start },
            content: String::new(),
            lines: Vec::new(),
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
        });
        id
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    /// Iterate over a node's direct children in order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Number of ancestors between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            depth += 1;
            cur = parent;
        }
        depth
    }

    /// Append a new open node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, value: NodeValue, start: Pos) -> NodeId {
        let child = self.alloc(value, start);
        let prev = self.node(parent).last_child;
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev = prev;
        }
        match prev {
            Some(prev) => self.node_mut(prev).next = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
        child
    }

    /// Detach `id` from its parent and siblings. The node stays in the
    /// arena; its own children are untouched.
    pub fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(id);
            (node.parent, node.prev, node.next)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = prev;
                }
            }
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.prev = None;
        node.next = None;
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's direct children.
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.next_sibling(id);
        Some(id)
    }
}

/// One step of a depth-first walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkEvent {
    pub node: NodeId,
    /// True when descending into the node, false when leaving it. Leaves
    /// produce both events back to back.
    pub entering: bool,
}

/// Depth-first walker yielding entering/leaving events in document order.
///
/// The walker holds only node ids, so node payloads (`content`, a code
/// block's `literal`) may be mutated between [`next`](TreeWalker::next)
/// calls. Structural mutation during a walk is not supported.
pub struct TreeWalker {
    root: NodeId,
    current: Option<(NodeId, bool)>,
}

impl TreeWalker {
    pub fn new(root: NodeId) -> Self {
        TreeWalker {
            root,
            current: Some((root, true)),
        }
    }

    /// Advance to the next event.
    pub fn next(&mut self, tree: &Tree) -> Option<WalkEvent> {
        let (node, entering) = self.current?;
        self.current = if entering {
            match tree.first_child(node) {
                Some(child) => Some((child, true)),
                None => Some((node, false)),
            }
        } else if node == self.root {
            None
        } else if let Some(sibling) = tree.next_sibling(node) {
            Some((sibling, true))
        } else {
            Some((tree.parent(node).expect("walked node has a parent"), false))
        };
        Some(WalkEvent { node, entering })
    }
}
