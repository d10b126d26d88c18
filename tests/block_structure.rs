use treemark::{parse, NodeValue};

#[test]
fn empty_input_is_bare_document() {
    let doc = parse("");
    assert!(matches!(
        doc.tree.node(doc.root()).value,
        NodeValue::Document
    ));
    assert_eq!(doc.tree.children(doc.root()).count(), 0);
    assert!(!doc.tree.node(doc.root()).open);
}

#[test]
fn single_newline_is_bare_document() {
    let doc = parse("\n");
    assert_eq!(doc.tree.children(doc.root()).count(), 0);
}

#[test]
fn missing_final_newline() {
    let doc = parse("last line");
    let para = doc.tree.first_child(doc.root()).unwrap();
    assert_eq!(doc.tree.node(para).content, "last line");
}

#[test]
fn nul_replaced_before_scanning() {
    let doc = parse("a\u{0}b\n");
    let para = doc.tree.first_child(doc.root()).unwrap();
    assert_eq!(doc.tree.node(para).content, "a\u{FFFD}b");
}

#[test]
fn crlf_and_cr_terminators() {
    let doc = parse("a\r\nb\rc\n");
    let para = doc.tree.first_child(doc.root()).unwrap();
    assert_eq!(doc.tree.node(para).content, "a\nb\nc");
}

#[test]
fn tab_expansion_finds_indented_code() {
    let doc = parse("\tcode\n");
    match &doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value {
        NodeValue::CodeBlock(code) => {
            assert!(!code.fenced);
            assert_eq!(code.literal, "code\n");
        }
        v => panic!("expected code block, got {v:?}"),
    }
}

#[test]
fn heading_levels() {
    for level in 1..=6u8 {
        let input = format!("{} text\n", "#".repeat(level as usize));
        let doc = parse(&input);
        match doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value {
            NodeValue::Heading { level: found } => assert_eq!(found, level),
            ref v => panic!("expected heading, got {v:?}"),
        }
    }
}

#[test]
fn heading_without_space_is_paragraph() {
    let doc = parse("#nope\n");
    assert!(matches!(
        doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value,
        NodeValue::Paragraph
    ));
}

#[test]
fn thematic_break_variants() {
    for input in ["---\n", "***\n", "___\n", "- - -\n", "   ---\n", "----------\n"] {
        let doc = parse(input);
        assert!(
            matches!(
                doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value,
                NodeValue::ThematicBreak
            ),
            "{input:?}"
        );
    }
}

#[test]
fn mixed_rule_chars_are_paragraph() {
    let doc = parse("-*-\n");
    assert!(matches!(
        doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value,
        NodeValue::Paragraph
    ));
}

#[test]
fn setext_level_two() {
    let doc = parse("title\n----\n");
    let node = doc.tree.first_child(doc.root()).unwrap();
    assert!(matches!(
        doc.tree.node(node).value,
        NodeValue::Heading { level: 2 }
    ));
    assert_eq!(doc.tree.node(node).content, "title");
}

#[test]
fn setext_without_paragraph_is_not_heading() {
    let doc = parse("===\n");
    assert!(matches!(
        doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value,
        NodeValue::Paragraph
    ));
}

#[test]
fn fence_with_info_string() {
    let doc = parse("```rust\nfn main() {}\n```\n");
    match &doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value {
        NodeValue::CodeBlock(code) => {
            assert_eq!(code.info, "rust");
            assert_eq!(code.fence_char, b'`');
            assert_eq!(code.literal, "fn main() {}\n");
        }
        v => panic!("expected code block, got {v:?}"),
    }
}

#[test]
fn tilde_fence_may_hold_backticks() {
    let doc = parse("~~~\n```\n~~~\n");
    match &doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value {
        NodeValue::CodeBlock(code) => assert_eq!(code.literal, "```\n"),
        v => panic!("expected code block, got {v:?}"),
    }
}

#[test]
fn empty_fenced_block() {
    let doc = parse("```\n```\n");
    match &doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value {
        NodeValue::CodeBlock(code) => {
            assert_eq!(code.info, "");
            assert_eq!(code.literal, "");
        }
        v => panic!("expected code block, got {v:?}"),
    }
}

#[test]
fn indented_fence_strips_opening_indent() {
    let doc = parse("  ```\n    code\n  ```\n");
    match &doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value {
        NodeValue::CodeBlock(code) => {
            assert_eq!(code.fence_offset, 2);
            assert_eq!(code.literal, "  code\n");
        }
        v => panic!("expected code block, got {v:?}"),
    }
}

#[test]
fn two_backticks_are_not_a_fence() {
    let doc = parse("``\ncode\n``\n");
    assert!(matches!(
        doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value,
        NodeValue::Paragraph
    ));
}

#[test]
fn blockquote_with_nested_list() {
    let doc = parse("> - a\n> - b\n");
    let quote = doc.tree.first_child(doc.root()).unwrap();
    assert!(matches!(doc.tree.node(quote).value, NodeValue::BlockQuote));
    let list = doc.tree.first_child(quote).unwrap();
    assert!(matches!(doc.tree.node(list).value, NodeValue::List(_)));
    assert_eq!(doc.tree.children(list).count(), 2);
}

#[test]
fn blank_line_splits_paragraphs() {
    let doc = parse("one\n\ntwo\n");
    let kids: Vec<_> = doc.tree.children(doc.root()).collect();
    assert_eq!(kids.len(), 2);
    assert_eq!(doc.tree.node(kids[0]).content, "one");
    assert_eq!(doc.tree.node(kids[1]).content, "two");
}

#[test]
fn blockquote_ends_at_blank_line() {
    let doc = parse("> a\n\n> b\n");
    let kids: Vec<_> = doc.tree.children(doc.root()).collect();
    assert_eq!(kids.len(), 2);
    for kid in kids {
        assert!(matches!(doc.tree.node(kid).value, NodeValue::BlockQuote));
    }
}

#[test]
fn html_block_keeps_leading_indent() {
    let doc = parse("  <div>\n  x\n");
    match &doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value {
        NodeValue::HtmlBlock { literal } => assert_eq!(literal, "  <div>\n  x"),
        v => panic!("expected html block, got {v:?}"),
    }
}

#[test]
fn html_comment_and_pi_open_blocks() {
    for input in ["<!-- note -->\n", "<?php echo 1 ?>\n"] {
        let doc = parse(input);
        assert!(
            matches!(
                doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value,
                NodeValue::HtmlBlock { .. }
            ),
            "{input:?}"
        );
    }
}

#[test]
fn unknown_tag_is_paragraph() {
    let doc = parse("<span>hi</span>\n");
    assert!(matches!(
        doc.tree.node(doc.tree.first_child(doc.root()).unwrap()).value,
        NodeValue::Paragraph
    ));
}

#[test]
fn item_with_indented_continuation() {
    let doc = parse("- first\n  second\n");
    let list = doc.tree.first_child(doc.root()).unwrap();
    let item = doc.tree.first_child(list).unwrap();
    let para = doc.tree.first_child(item).unwrap();
    assert_eq!(doc.tree.node(para).content, "first\nsecond");
}

#[test]
fn wide_marker_spacing_starts_indented_code() {
    let doc = parse("-     code\n");
    let list = doc.tree.first_child(doc.root()).unwrap();
    let item = doc.tree.first_child(list).unwrap();
    match &doc.tree.node(doc.tree.first_child(item).unwrap()).value {
        NodeValue::CodeBlock(code) => {
            assert!(!code.fenced);
            assert_eq!(code.literal, "code\n");
        }
        v => panic!("expected code block, got {v:?}"),
    }
}
