use std::cell::RefCell;
use std::rc::Rc;

use treemark::{parse, BlockParser, InlineParser, NodeId, NodeValue, RefMap, Tree};

#[test]
fn definition_is_harvested_and_paragraph_removed() {
    let doc = parse("[foo]: /url \"title\"\n\nsee [foo]\n");
    let kids: Vec<_> = doc.tree.children(doc.root()).collect();
    assert_eq!(kids.len(), 1);
    assert_eq!(doc.tree.node(kids[0]).content, "see [foo]");
    let def = doc.refmap.get("foo").unwrap();
    assert_eq!(def.destination, "/url");
    assert_eq!(def.title, "title");
}

#[test]
fn lookup_is_case_folded() {
    let doc = parse("[FoO]: /x\n");
    assert!(doc.refmap.get("foo").is_some());
    assert!(doc.refmap.get("  FOO  ").is_some());
}

#[test]
fn first_definition_wins() {
    let doc = parse("[a]: /first\n\n[a]: /second\n");
    assert_eq!(doc.tree.children(doc.root()).count(), 0);
    assert_eq!(doc.refmap.get("a").unwrap().destination, "/first");
    assert_eq!(doc.refmap.len(), 1);
}

#[test]
fn several_definitions_in_one_paragraph() {
    let doc = parse("[a]: /1\n[b]: /2\n[c]: /3\n");
    assert_eq!(doc.tree.children(doc.root()).count(), 0);
    assert_eq!(doc.refmap.len(), 3);
    assert_eq!(doc.refmap.get("b").unwrap().destination, "/2");
}

#[test]
fn definition_followed_by_text_keeps_paragraph() {
    let doc = parse("[a]: /1\nrest of paragraph\n");
    let kids: Vec<_> = doc.tree.children(doc.root()).collect();
    assert_eq!(kids.len(), 1);
    assert_eq!(doc.tree.node(kids[0]).content, "rest of paragraph");
    assert_eq!(doc.refmap.get("a").unwrap().destination, "/1");
}

#[test]
fn definition_title_on_second_line() {
    let doc = parse("[a]: /url\n\"the title\"\n");
    assert_eq!(doc.tree.children(doc.root()).count(), 0);
    assert_eq!(doc.refmap.get("a").unwrap().title, "the title");
}

#[test]
fn non_definition_bracket_text_is_kept() {
    let doc = parse("[not a def] trailing\n");
    let kids: Vec<_> = doc.tree.children(doc.root()).collect();
    assert_eq!(kids.len(), 1);
    assert!(doc.refmap.is_empty());
}

#[test]
fn title_with_trailing_garbage_is_plain_text() {
    let doc = parse("[a]: /u \"t\" extra\n");
    let kids: Vec<_> = doc.tree.children(doc.root()).collect();
    assert_eq!(kids.len(), 1);
    assert_eq!(doc.tree.node(kids[0]).content, "[a]: /u \"t\" extra");
    assert!(doc.refmap.is_empty());
}

#[test]
fn definition_inside_blockquote() {
    let doc = parse("> [a]: /u\n");
    assert_eq!(doc.refmap.get("a").unwrap().destination, "/u");
    let quote = doc.tree.first_child(doc.root()).unwrap();
    assert_eq!(doc.tree.children(quote).count(), 0);
}

#[test]
fn escaped_label_matches_unescaped_lookup() {
    let doc = parse("[a\\]b]: /u\n");
    assert!(doc.refmap.get("a]b").is_some());
}

#[test]
fn indented_definition_is_code_not_reference() {
    let doc = parse("    [a]: /u\n");
    assert!(doc.refmap.is_empty());
    assert!(matches!(
        doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value,
        NodeValue::CodeBlock(_)
    ));
}

#[derive(Default)]
struct Log {
    inline_nodes: Vec<String>,
    reference_calls: usize,
}

/// Records collaborator calls; recognizes no references.
struct Recorder(Rc<RefCell<Log>>);

impl InlineParser for Recorder {
    fn parse_reference(&mut self, _text: &str, _refmap: &mut RefMap) -> usize {
        self.0.borrow_mut().reference_calls += 1;
        0
    }

    fn parse_inlines(&mut self, tree: &mut Tree, node: NodeId, _refmap: &RefMap) {
        let label = match &tree.node(node).value {
            NodeValue::Paragraph => "paragraph",
            NodeValue::Heading { .. } => "heading",
            v => panic!("unexpected inline target {v:?}"),
        };
        self.0.borrow_mut().inline_nodes.push(label.to_string());
    }
}

#[test]
fn collaborator_sees_paragraphs_and_headings_in_order() {
    let log = Rc::new(RefCell::new(Log::default()));
    let doc = BlockParser::with_collaborator(Recorder(Rc::clone(&log)))
        .parse("# h\n\npara\n\n> quoted\n");
    assert_eq!(doc.tree.children(doc.root()).count(), 3);
    assert_eq!(
        log.borrow().inline_nodes,
        vec!["heading", "paragraph", "paragraph"]
    );
}

#[test]
fn stub_reference_scanner_keeps_definition_text() {
    let log = Rc::new(RefCell::new(Log::default()));
    let doc =
        BlockParser::with_collaborator(Recorder(Rc::clone(&log))).parse("[a]: /u\n");
    let kids: Vec<_> = doc.tree.children(doc.root()).collect();
    assert_eq!(kids.len(), 1);
    assert_eq!(doc.tree.node(kids[0]).content, "[a]: /u");
    assert_eq!(log.borrow().reference_calls, 1);
    assert!(doc.refmap.is_empty());
}
