//! treemark: streaming block-structure parser for CommonMark.
//!
//! This crate consumes a text document line by line and produces a tree of
//! block-level nodes (paragraphs, headings, block quotes, lists, code
//! blocks, HTML blocks) with 1-based line/column source spans. Inline
//! parsing is deliberately not performed here: a pluggable collaborator
//! ([`InlineParser`]) harvests link reference definitions while paragraphs
//! finalize and receives every paragraph and heading once block structure is
//! complete.
//!
//! # Design principles
//! - Line-oriented: every input line passes through continuation, opening,
//!   and content phases against the stack of currently open containers
//! - Arena tree: nodes are `u32` indices into a parser-owned arena, so
//!   parent and sibling links are plain ids with no reference cycles
//! - No syntax errors: any byte sequence produces a tree
//!
//! # Example
//! ```
//! let doc = treemark::parse("# Hello\n\nWorld");
//! let root = doc.tree.root();
//! assert_eq!(doc.tree.children(root).count(), 2);
//! ```

pub mod block;
pub mod inline;
pub mod input;
pub mod limits;
pub mod refmap;
pub mod scan;
pub mod tree;

// Re-export primary types
pub use block::{BlockParser, Document};
pub use inline::{InlineParser, RefScanner};
pub use refmap::{RefMap, Reference};
pub use tree::{
    CodeBlockData, ListData, ListDelim, ListType, NodeData, NodeId, NodeValue, Pos, Sourcepos,
    Tree, TreeWalker, WalkEvent,
};

/// Parse options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Print per-phase timings ("preparing input", "block parsing",
    /// "inline parsing") to stderr.
    pub time: bool,
}

/// Parse a document into a block tree.
///
/// This is the primary API for simple use cases.
///
/// # Example
/// ```
/// let doc = treemark::parse("> quoted\n");
/// let quote = doc.tree.first_child(doc.tree.root()).unwrap();
/// assert!(matches!(
///     doc.tree.node(quote).value,
///     treemark::NodeValue::BlockQuote
/// ));
/// ```
pub fn parse(input: &str) -> Document {
    parse_with_options(input, &Options::default())
}

/// Parse a document with explicit options.
pub fn parse_with_options(input: &str, options: &Options) -> Document {
    BlockParser::new().options(options.clone()).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_paragraph() {
        let doc = parse("Hello, world!");
        let para = doc.tree.first_child(doc.tree.root()).unwrap();
        assert!(matches!(doc.tree.node(para).value, NodeValue::Paragraph));
        assert_eq!(doc.tree.node(para).content, "Hello, world!");
    }

    #[test]
    fn test_heading_and_paragraph() {
        let doc = parse("# Title\n\nContent here.");
        let root = doc.tree.root();
        let children: Vec<_> = doc.tree.children(root).collect();
        assert_eq!(children.len(), 2);
        assert!(matches!(
            doc.tree.node(children[0]).value,
            NodeValue::Heading { level: 1 }
        ));
        assert_eq!(doc.tree.node(children[1]).content, "Content here.");
    }

    #[test]
    fn test_empty_input() {
        let doc = parse("");
        assert_eq!(doc.tree.children(doc.tree.root()).count(), 0);
    }

    #[test]
    fn test_only_whitespace() {
        let doc = parse("   \n\n   ");
        assert_eq!(doc.tree.children(doc.tree.root()).count(), 0);
    }

    #[test]
    fn test_options_default_silent() {
        let options = Options::default();
        assert!(!options.time);
        let doc = parse_with_options("text", &options);
        assert_eq!(doc.tree.children(doc.tree.root()).count(), 1);
    }
}
