//! Line-oriented markdown for assistant answers.
//!
//! [`parse`] turns an answer into typed [`Block`]s. Each line is classified by
//! the first matching entry of [`RULES`]; a run of `- ` items accumulates into
//! one pending list that every other rule flushes first. Text inside blocks is
//! split into [`Inline`] runs with `$$..$$` and `$..$` math pulled out.
//!
//! The blocks are rendered by [`html::to_html`] or [`terminal::render_lines`].

pub mod html;
pub mod math;
mod rules;
pub mod terminal;

#[cfg(test)]
mod tests;

pub use math::{MathOutput, MathRenderer, TexChecker, TexError};
pub use rules::{classify, Rule, RuleKind, RULES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Math { tex: String, display: bool },
    Link { text: String, href: String },
    Code(String),
    Bold(Vec<Inline>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Code {
        language: Option<String>,
        body: String,
    },
    Divider,
    Quote(Vec<Inline>),
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    Image {
        alt: String,
        src: String,
    },
    List(Vec<Vec<Inline>>),
    LineBreak,
}

/// Parses `text` line by line into blocks.
pub fn parse(text: &str) -> Vec<Block> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut parser = Parser::new(text);
    parser.run();
    parser.blocks
}

/// Cursor over the input lines plus the output under construction.
pub(crate) struct Parser<'a> {
    lines: Vec<&'a str>,
    next: usize,
    pub(crate) blocks: Vec<Block>,
    pending_list: Vec<Vec<Inline>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
            next: 0,
            blocks: Vec::new(),
            pending_list: Vec::new(),
        }
    }

    fn run(&mut self) {
        while let Some(line) = self.lines.get(self.next).copied() {
            self.next += 1;
            let rule = rules::rule_for(line);
            if rule.flushes_list {
                self.flush_list();
            }
            (rule.apply)(self, line);
        }
        self.flush_list();
    }

    pub(crate) fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub(crate) fn push_list_item(&mut self, item: Vec<Inline>) {
        self.pending_list.push(item);
    }

    fn flush_list(&mut self) {
        if !self.pending_list.is_empty() {
            let items = std::mem::take(&mut self.pending_list);
            self.blocks.push(Block::List(items));
        }
    }

    /// Consumes lines up to the next fence. Returns `None`, consuming
    /// nothing, when no closing fence follows.
    pub(crate) fn take_fenced_body(&mut self) -> Option<String> {
        let rest = &self.lines[self.next..];
        let close = rest.iter().position(|line| line.starts_with("```"))?;
        let body = rest[..close].join("\n");
        self.next += close + 1;
        Some(body)
    }
}
