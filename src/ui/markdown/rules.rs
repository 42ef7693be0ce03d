use std::sync::LazyLock;

use regex::Regex;

use super::math::segment;
use super::{Block, Inline, Parser};

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("link regex is invalid"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("image regex is invalid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    CodeFence,
    Divider,
    Quote,
    Link,
    InlineCode,
    Heading,
    Image,
    Bold,
    ListItem,
    Blank,
    Paragraph,
}

/// One line classification. The first rule whose `matches` accepts a line
/// handles it.
pub struct Rule {
    pub kind: RuleKind,
    pub matches: fn(&str) -> bool,
    /// Everything but list items closes the pending list before `apply`.
    pub flushes_list: bool,
    pub(crate) apply: fn(&mut Parser<'_>, &str),
}

pub static RULES: &[Rule] = &[
    Rule {
        kind: RuleKind::CodeFence,
        matches: is_code_fence,
        flushes_list: true,
        apply: apply_code_fence,
    },
    Rule {
        kind: RuleKind::Divider,
        matches: is_divider,
        flushes_list: true,
        apply: apply_divider,
    },
    Rule {
        kind: RuleKind::Quote,
        matches: is_quote,
        flushes_list: true,
        apply: apply_quote,
    },
    Rule {
        kind: RuleKind::Link,
        matches: has_link_markers,
        flushes_list: true,
        apply: apply_link,
    },
    Rule {
        kind: RuleKind::InlineCode,
        matches: has_backtick,
        flushes_list: true,
        apply: apply_inline_code,
    },
    Rule {
        kind: RuleKind::Heading,
        matches: is_heading,
        flushes_list: true,
        apply: apply_heading,
    },
    Rule {
        kind: RuleKind::Image,
        matches: is_image,
        flushes_list: true,
        apply: apply_image,
    },
    Rule {
        kind: RuleKind::Bold,
        matches: has_bold_marker,
        flushes_list: true,
        apply: apply_bold,
    },
    Rule {
        kind: RuleKind::ListItem,
        matches: is_list_item,
        flushes_list: false,
        apply: apply_list_item,
    },
    Rule {
        kind: RuleKind::Blank,
        matches: is_blank,
        flushes_list: true,
        apply: apply_blank,
    },
    Rule {
        kind: RuleKind::Paragraph,
        matches: any_line,
        flushes_list: true,
        apply: apply_paragraph,
    },
];

pub(crate) fn rule_for(line: &str) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| (rule.matches)(line))
        .unwrap_or(&RULES[RULES.len() - 1])
}

/// Which rule handles `line` when it starts a block.
pub fn classify(line: &str) -> RuleKind {
    rule_for(line).kind
}

fn is_code_fence(line: &str) -> bool {
    line.starts_with("```")
}

fn is_divider(line: &str) -> bool {
    line.trim() == "---"
}

fn is_quote(line: &str) -> bool {
    line.starts_with("> ")
}

fn has_link_markers(line: &str) -> bool {
    let Some(open) = line.find('[') else {
        return false;
    };
    let Some(middle) = line[open..].find("](") else {
        return false;
    };
    line[open + middle + 2..].contains(')')
}

fn has_backtick(line: &str) -> bool {
    line.contains('`')
}

const HEADING_PREFIXES: [(&str, u8); 3] = [("### ", 3), ("## ", 2), ("# ", 1)];

fn heading_level(line: &str) -> Option<(u8, &str)> {
    HEADING_PREFIXES
        .iter()
        .find_map(|(prefix, level)| line.strip_prefix(prefix).map(|rest| (*level, rest)))
}

fn is_heading(line: &str) -> bool {
    heading_level(line).is_some()
}

fn is_image(line: &str) -> bool {
    line.starts_with("![")
}

fn has_bold_marker(line: &str) -> bool {
    line.contains("**")
}

fn is_list_item(line: &str) -> bool {
    line.starts_with("- ")
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn any_line(_: &str) -> bool {
    true
}

fn apply_code_fence(parser: &mut Parser<'_>, line: &str) {
    let block = match parser.take_fenced_body() {
        Some(body) => {
            let language = line[3..]
                .split_whitespace()
                .next()
                .map(str::to_string);
            Block::Code { language, body }
        }
        // Unclosed: the opening line minus its marker is the whole body.
        None => Block::Code {
            language: None,
            body: line.replacen("```", "", 1),
        },
    };
    parser.push(block);
}

fn apply_divider(parser: &mut Parser<'_>, _line: &str) {
    parser.push(Block::Divider);
}

fn apply_quote(parser: &mut Parser<'_>, line: &str) {
    parser.push(Block::Quote(segment(&line[2..])));
}

fn apply_link(parser: &mut Parser<'_>, line: &str) {
    let mut content = Vec::new();
    let mut last = 0;
    for caps in LINK.captures_iter(line) {
        let (Some(whole), Some(text), Some(href)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        content.extend(segment(&line[last..whole.start()]));
        content.push(Inline::Link {
            text: text.as_str().to_string(),
            href: href.as_str().to_string(),
        });
        last = whole.end();
    }
    content.extend(segment(&line[last..]));
    parser.push(Block::Paragraph(content));
}

fn apply_inline_code(parser: &mut Parser<'_>, line: &str) {
    let mut content = Vec::new();
    for (index, part) in line.split('`').enumerate() {
        if index % 2 == 0 {
            content.extend(segment(part));
        } else {
            content.push(Inline::Code(part.to_string()));
        }
    }
    parser.push(Block::Paragraph(content));
}

fn apply_heading(parser: &mut Parser<'_>, line: &str) {
    if let Some((level, rest)) = heading_level(line) {
        parser.push(Block::Heading {
            level,
            content: segment(rest),
        });
    }
}

fn apply_image(parser: &mut Parser<'_>, line: &str) {
    if let Some(caps) = IMAGE.captures(line) {
        let alt = caps.get(1).map_or("", |m| m.as_str());
        let src = caps.get(2).map_or("", |m| m.as_str());
        parser.push(Block::Image {
            alt: alt.to_string(),
            src: src.to_string(),
        });
    }
}

fn apply_bold(parser: &mut Parser<'_>, line: &str) {
    let mut content = Vec::new();
    for (index, part) in line.split("**").enumerate() {
        if index % 2 == 0 {
            content.extend(segment(part));
        } else {
            content.push(Inline::Bold(segment(part)));
        }
    }
    parser.push(Block::Paragraph(content));
}

fn apply_list_item(parser: &mut Parser<'_>, line: &str) {
    parser.push_list_item(segment(&line[2..]));
}

fn apply_blank(parser: &mut Parser<'_>, _line: &str) {
    parser.push(Block::LineBreak);
}

fn apply_paragraph(parser: &mut Parser<'_>, line: &str) {
    parser.push(Block::Paragraph(segment(line)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_is_the_precedence_order() {
        let kinds: Vec<RuleKind> = RULES.iter().map(|rule| rule.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RuleKind::CodeFence,
                RuleKind::Divider,
                RuleKind::Quote,
                RuleKind::Link,
                RuleKind::InlineCode,
                RuleKind::Heading,
                RuleKind::Image,
                RuleKind::Bold,
                RuleKind::ListItem,
                RuleKind::Blank,
                RuleKind::Paragraph,
            ]
        );
        assert!(RULES
            .iter()
            .all(|rule| rule.flushes_list == (rule.kind != RuleKind::ListItem)));
    }

    #[test]
    fn each_rule_matches_its_own_lines() {
        assert_eq!(classify("```rust"), RuleKind::CodeFence);
        assert_eq!(classify("  ---  "), RuleKind::Divider);
        assert_eq!(classify("> quoted"), RuleKind::Quote);
        assert_eq!(classify("see [docs](https://x.y)"), RuleKind::Link);
        assert_eq!(classify("run `ls`"), RuleKind::InlineCode);
        assert_eq!(classify("# Title"), RuleKind::Heading);
        assert_eq!(classify("## Title"), RuleKind::Heading);
        assert_eq!(classify("### Title"), RuleKind::Heading);
        assert_eq!(classify("![alt only"), RuleKind::Image);
        assert_eq!(classify("some **bold**"), RuleKind::Bold);
        assert_eq!(classify("- item"), RuleKind::ListItem);
        assert_eq!(classify("   "), RuleKind::Blank);
        assert_eq!(classify("plain"), RuleKind::Paragraph);
    }

    #[test]
    fn earlier_rules_win_on_ambiguous_lines() {
        assert_eq!(classify("```**not bold**"), RuleKind::CodeFence);
        assert_eq!(classify("> see [a](b)"), RuleKind::Quote);
        assert_eq!(classify("# [a](b)"), RuleKind::Link);
        // A complete image always carries the link markers too.
        assert_eq!(classify("![img](src)"), RuleKind::Link);
        assert_eq!(classify("- `code` item"), RuleKind::InlineCode);
        assert_eq!(classify("- **bold** item"), RuleKind::Bold);
        assert_eq!(classify("- $x$ item"), RuleKind::ListItem);
        assert_eq!(classify("## **title**"), RuleKind::Heading);
    }

    #[test]
    fn link_markers_must_appear_in_order() {
        assert!(has_link_markers("[a](b)"));
        assert!(has_link_markers("x [a] y](z)"));
        assert!(!has_link_markers(") ]( ["));
        assert!(!has_link_markers("[a](b"));
        assert!(!has_link_markers("f(x) [y]"));
    }

    #[test]
    fn near_misses_fall_through() {
        assert_eq!(classify("#Title"), RuleKind::Paragraph);
        assert_eq!(classify("-item"), RuleKind::Paragraph);
        assert_eq!(classify(">quote"), RuleKind::Paragraph);
        assert_eq!(classify("----"), RuleKind::Paragraph);
        assert_eq!(classify("![broken"), RuleKind::Image);
    }
}
