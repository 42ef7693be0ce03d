//! HTML fragment output. Math is left as KaTeX auto-render delimiters.

use std::fmt::Write;

use super::math::{MathOutput, MathRenderer};
use super::{Block, Inline};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn to_html(blocks: &[Block], math: &dyn MathRenderer) -> String {
    let mut out = String::new();
    for block in blocks {
        write_block(&mut out, block, math);
        out.push('\n');
    }
    out
}

fn write_block(out: &mut String, block: &Block, math: &dyn MathRenderer) {
    match block {
        Block::Code { language, body } => {
            match language {
                Some(lang) => {
                    let _ = write!(out, "<pre><code class=\"language-{}\">", escape(lang));
                }
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&escape(body));
            out.push_str("</code></pre>");
        }
        Block::Divider => out.push_str("<hr>"),
        Block::Quote(content) => {
            out.push_str("<blockquote>");
            write_inlines(out, content, math);
            out.push_str("</blockquote>");
        }
        Block::Paragraph(content) => {
            out.push_str("<p>");
            write_inlines(out, content, math);
            out.push_str("</p>");
        }
        Block::Heading { level, content } => {
            let _ = write!(out, "<h{level}>");
            write_inlines(out, content, math);
            let _ = write!(out, "</h{level}>");
        }
        Block::Image { alt, src } => {
            let _ = write!(
                out,
                "<figure><img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                escape(src),
                escape(alt)
            );
            if !alt.is_empty() {
                let _ = write!(out, "<figcaption>{}</figcaption>", escape(alt));
            }
            out.push_str("</figure>");
        }
        Block::List(items) => {
            out.push_str("<ul>");
            for item in items {
                out.push_str("<li>");
                write_inlines(out, item, math);
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }
        Block::LineBreak => out.push_str("<br>"),
    }
}

fn write_inlines(out: &mut String, inlines: &[Inline], math: &dyn MathRenderer) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape(text)),
            Inline::Math { tex, display } => write_math(out, tex, *display, math),
            Inline::Link { text, href } => {
                let _ = write!(
                    out,
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                    escape(href),
                    escape(text)
                );
            }
            Inline::Code(code) => {
                let _ = write!(out, "<code>{}</code>", escape(code));
            }
            Inline::Bold(children) => {
                out.push_str("<strong>");
                write_inlines(out, children, math);
                out.push_str("</strong>");
            }
        }
    }
}

fn write_math(out: &mut String, tex: &str, display: bool, math: &dyn MathRenderer) {
    // Spans either way: display math sits inside <p>, styled as a block.
    let class = if display { "math-block" } else { "math-inline" };
    match math.render(tex, display) {
        MathOutput::Rendered(markup) => {
            let _ = write!(out, "<span class=\"{class}\">{}</span>", escape(&markup));
        }
        MathOutput::Error(text) => {
            let _ = write!(
                out,
                "<span class=\"{class} math-error\">{}</span>",
                escape(&text)
            );
        }
    }
}
