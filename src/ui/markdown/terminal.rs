//! ratatui lines for the terminal client.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use super::math::{error_text, to_unicode, TexChecker};
use super::{Block, Inline};
use crate::ui::theme::Theme;

const DEFAULT_DIVIDER_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy)]
pub struct TerminalOptions {
    /// Wrap width in columns; 0 disables wrapping.
    pub width: usize,
    pub syntax: bool,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            width: 80,
            syntax: true,
        }
    }
}

pub fn render_lines(
    blocks: &[Block],
    theme: &Theme,
    options: TerminalOptions,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            Block::Code { language, body } => {
                lines.extend(code_lines(language.as_deref(), body, theme, options.syntax));
            }
            Block::Divider => {
                let width = if options.width == 0 {
                    DEFAULT_DIVIDER_WIDTH
                } else {
                    options.width
                };
                lines.push(Line::from(Span::styled("─".repeat(width), theme.divider_style)));
            }
            Block::Quote(content) => {
                let spans = inline_spans(content, theme.quote_text_style, theme);
                let bar = Span::styled("│ ", theme.quote_bar_style);
                lines.extend(wrap(spans, options.width, bar.clone(), bar));
            }
            Block::Paragraph(content) => {
                let spans = inline_spans(content, theme.text_style, theme);
                lines.extend(wrap(spans, options.width, Span::raw(""), Span::raw("")));
            }
            Block::Heading { level, content } => {
                let spans = inline_spans(content, theme.heading_style(*level), theme);
                lines.extend(wrap(spans, options.width, Span::raw(""), Span::raw("")));
            }
            Block::Image { alt, src } => {
                let label = if alt.is_empty() { src.as_str() } else { alt.as_str() };
                lines.push(Line::from(vec![
                    Span::styled(format!("[image: {label}]"), theme.caption_style),
                    Span::styled(format!(" {src}"), theme.link_style),
                ]));
            }
            Block::List(items) => {
                for item in items {
                    let spans = inline_spans(item, theme.text_style, theme);
                    lines.extend(wrap(
                        spans,
                        options.width,
                        Span::styled("• ", theme.list_marker_style),
                        Span::raw("  "),
                    ));
                }
            }
            Block::LineBreak => lines.push(Line::default()),
        }
    }
    lines
}

fn code_lines(
    language: Option<&str>,
    body: &str,
    theme: &Theme,
    syntax: bool,
) -> Vec<Line<'static>> {
    let highlighted = match language {
        Some(lang) if syntax => crate::utils::syntax::highlight_code_block(lang, body, theme),
        _ => None,
    };
    highlighted.unwrap_or_else(|| {
        let mut style = theme.md_codeblock_text_style();
        if let Some(bg) = theme.md_codeblock_bg_color() {
            style = style.bg(bg);
        }
        body.split('\n')
            .map(|line| Line::from(Span::styled(line.replace('\t', "    "), style)))
            .collect()
    })
}

/// Styled spans for inline content, each run patched over `base`.
pub fn inline_spans(inlines: &[Inline], base: Style, theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => spans.push(Span::styled(text.clone(), base)),
            Inline::Math { tex, display } => match TexChecker::check(tex) {
                Ok(()) => spans.push(Span::styled(
                    to_unicode(tex),
                    base.patch(theme.math_style),
                )),
                Err(_) => spans.push(Span::styled(
                    error_text(tex, *display),
                    base.patch(theme.math_error_style),
                )),
            },
            Inline::Link { text, href } => {
                spans.push(Span::styled(text.clone(), base.patch(theme.link_style)));
                spans.push(Span::styled(format!(" <{href}>"), theme.caption_style));
            }
            Inline::Code(code) => {
                spans.push(Span::styled(code.clone(), theme.inline_code_style));
            }
            Inline::Bold(children) => {
                spans.extend(inline_spans(children, base.patch(theme.bold_style), theme));
            }
        }
    }
    spans
}

/// Greedy word wrap keeping span styles. `first` prefixes the first line,
/// `rest` every continuation line.
fn wrap(
    spans: Vec<Span<'static>>,
    width: usize,
    first: Span<'static>,
    rest: Span<'static>,
) -> Vec<Line<'static>> {
    let prefix_width = first.width().max(rest.width());
    let available = width.saturating_sub(prefix_width);
    if width == 0 || available == 0 {
        let mut all = vec![first];
        all.extend(spans);
        return vec![Line::from(all)];
    }

    let mut lines = Vec::new();
    let mut current = vec![first];
    let mut current_width = 0usize;

    for span in spans {
        for word in span.content.split_inclusive(' ') {
            let word_width = UnicodeWidthStr::width(word.trim_end());
            if current_width > 0 && current_width + word_width > available {
                lines.push(finish_line(std::mem::replace(&mut current, vec![rest.clone()])));
                current_width = 0;
            }
            let mut word = if current_width == 0 { word.trim_start() } else { word };
            // Hard break a token longer than the whole line.
            while UnicodeWidthStr::width(word.trim_end()) > available {
                let mut cut = split_at_width(word, available);
                if cut == 0 {
                    cut = word.chars().next().map_or(word.len(), char::len_utf8);
                }
                current.push(Span::styled(word[..cut].to_string(), span.style));
                lines.push(finish_line(std::mem::replace(&mut current, vec![rest.clone()])));
                current_width = 0;
                word = &word[cut..];
            }
            if !word.is_empty() {
                current_width += UnicodeWidthStr::width(word);
                current.push(Span::styled(word.to_string(), span.style));
            }
        }
    }
    lines.push(finish_line(current));
    lines
}

/// Drops the spaces left at a soft break.
fn finish_line(mut spans: Vec<Span<'static>>) -> Line<'static> {
    while spans.len() > 1 {
        let Some(last) = spans.last_mut() else {
            break;
        };
        let trimmed = last.content.trim_end().to_string();
        if trimmed.len() == last.content.len() {
            break;
        }
        if trimmed.is_empty() {
            spans.pop();
        } else {
            last.content = trimmed.into();
            break;
        }
    }
    Line::from(spans)
}

/// Largest byte index whose prefix fits in `max` columns.
fn split_at_width(text: &str, max: usize) -> usize {
    let mut width = 0;
    for (index, ch) in text.char_indices() {
        let cw = UnicodeWidthStr::width(ch.encode_utf8(&mut [0; 4]));
        if width + cw > max {
            return index;
        }
        width += cw;
    }
    text.len()
}
