use super::{math, paragraph, text};
use crate::ui::markdown::{parse, Block, Inline};

#[test]
fn empty_input_has_no_blocks() {
    assert!(parse("").is_empty());
}

#[test]
fn fenced_code_keeps_body_verbatim_and_resumes_after_fence() {
    assert_eq!(
        parse("```rust\nlet a = **b**;\n# not a heading\n```\nafter"),
        vec![
            Block::Code {
                language: Some("rust".into()),
                body: "let a = **b**;\n# not a heading".into(),
            },
            paragraph(vec![text("after")]),
        ]
    );
}

#[test]
fn unclosed_fence_uses_rest_of_opening_line() {
    assert_eq!(
        parse("```echo hi\nnext line"),
        vec![
            Block::Code {
                language: None,
                body: "echo hi".into(),
            },
            paragraph(vec![text("next line")]),
        ]
    );
}

#[test]
fn empty_fenced_block() {
    assert_eq!(
        parse("```\n```"),
        vec![Block::Code {
            language: None,
            body: String::new(),
        }]
    );
}

#[test]
fn divider_ignores_surrounding_whitespace() {
    assert_eq!(parse("  --- "), vec![Block::Divider]);
}

#[test]
fn quote_strips_prefix_and_segments_math() {
    assert_eq!(
        parse("> so $e^{i\\pi}$"),
        vec![Block::Quote(vec![text("so "), math("e^{i\\pi}", false)])]
    );
}

#[test]
fn headings_by_level() {
    assert_eq!(
        parse("# One\n## Two\n### Three $x$"),
        vec![
            Block::Heading {
                level: 1,
                content: vec![text("One")],
            },
            Block::Heading {
                level: 2,
                content: vec![text("Two")],
            },
            Block::Heading {
                level: 3,
                content: vec![text("Three "), math("x", false)],
            },
        ]
    );
}

#[test]
fn four_hashes_are_a_paragraph() {
    assert_eq!(parse("#### deep"), vec![paragraph(vec![text("#### deep")])]);
}

#[test]
fn complete_image_syntax_renders_through_link_rule() {
    assert_eq!(
        parse("![chart](c.png)"),
        vec![paragraph(vec![
            text("!"),
            Inline::Link {
                text: "chart".into(),
                href: "c.png".into(),
            },
        ])]
    );
}

#[test]
fn blank_lines_become_line_breaks() {
    assert_eq!(
        parse("a\n\n   \nb\n"),
        vec![
            paragraph(vec![text("a")]),
            Block::LineBreak,
            Block::LineBreak,
            paragraph(vec![text("b")]),
            Block::LineBreak,
        ]
    );
}

#[test]
fn block_math_line_is_one_element() {
    assert_eq!(parse("$$x^2$$"), vec![paragraph(vec![math("x^2", true)])]);
}

#[test]
fn mixed_document() {
    let doc = "# Service error\n\n**Sorry.**\n\n- Error: 500\n- Status: retry\n\n*Soon.*";
    let blocks = parse(doc);
    assert_eq!(blocks.len(), 7);
    assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
    assert_eq!(
        blocks[2],
        paragraph(vec![Inline::Bold(vec![text("Sorry.")])])
    );
    assert_eq!(
        blocks[4],
        Block::List(vec![vec![text("Error: 500")], vec![text("Status: retry")]])
    );
    assert_eq!(blocks[6], paragraph(vec![text("*Soon.*")]));
}
