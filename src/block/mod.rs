//! Block-level parsing.
//!
//! The block parser is line-oriented and builds the tree for:
//! - Thematic breaks
//! - ATX and setext headings
//! - Fenced and indented code blocks
//! - HTML blocks
//! - Blockquotes
//! - Lists and list items
//! - Paragraphs

mod parser;

pub use parser::BlockParser;

use crate::refmap::RefMap;
use crate::tree::{NodeId, Tree, TreeWalker};

/// A parsed document: the block tree plus the link reference definitions
/// harvested while paragraphs finalized.
#[derive(Debug)]
pub struct Document {
    pub tree: Tree,
    pub refmap: RefMap,
}

impl Document {
    /// The root `Document` node.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Walk the tree in document order.
    pub fn walker(&self) -> TreeWalker {
        TreeWalker::new(self.tree.root())
    }
}
