//! syntect highlighting for fenced code blocks.

use crate::ui::theme::Theme;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use std::collections::{HashMap, VecDeque};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{LazyLock, Mutex};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const CACHE_CAPACITY: usize = 64;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);
static CACHE: LazyLock<Mutex<HighlightCache>> =
    LazyLock::new(|| Mutex::new(HighlightCache::default()));

/// Bounded FIFO of highlighted blocks.
#[derive(Default)]
struct HighlightCache {
    entries: HashMap<u64, Vec<Line<'static>>>,
    order: VecDeque<u64>,
}

impl HighlightCache {
    fn get(&self, key: u64) -> Option<Vec<Line<'static>>> {
        self.entries.get(&key).cloned()
    }

    fn put(&mut self, key: u64, lines: Vec<Line<'static>>) {
        if self.entries.insert(key, lines).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > CACHE_CAPACITY {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

fn is_dark(color: Color) -> bool {
    match color {
        Color::Rgb(r, g, b) => {
            0.2126 * f32::from(r) + 0.7152 * f32::from(g) + 0.0722 * f32::from(b) < 128.0
        }
        Color::White => false,
        _ => true,
    }
}

fn normalize_lang_hint(hint: &str) -> String {
    let lower = hint.trim().to_ascii_lowercase();
    let canonical = match lower.as_str() {
        "py" => "python",
        "sh" | "zsh" | "shell" | "console" => "bash",
        "js" | "jsx" | "node" => "javascript",
        "ts" | "tsx" => "typescript",
        "yml" => "yaml",
        "rs" => "rust",
        "h" => "c",
        "cc" | "cxx" | "hpp" | "c++" => "cpp",
        "kt" => "kotlin",
        "tex" | "latex" => "latex",
        other => other,
    };
    canonical.to_string()
}

pub(crate) fn syntect_theme_name(theme: &Theme) -> &'static str {
    if is_dark(theme.background_color) {
        "base16-ocean.dark"
    } else {
        "InspiredGitHub"
    }
}

fn cache_key(lang: &str, code: &str, theme: &Theme, syntect_theme: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    syntect_theme.hash(&mut hasher);
    format!("{:?}{:?}", theme.background_color, theme.md_codeblock_bg_color()).hash(&mut hasher);
    hasher.finish()
}

/// Highlights `code` as `lang_hint`, one line per source line.
///
/// Unknown languages fall back to plain text; `None` means syntect failed.
pub fn highlight_code_block(
    lang_hint: &str,
    code: &str,
    theme: &Theme,
) -> Option<Vec<Line<'static>>> {
    let lang = normalize_lang_hint(lang_hint);
    let theme_name = syntect_theme_name(theme);
    let key = cache_key(&lang, code, theme, theme_name);
    if let Some(lines) = CACHE.lock().ok().and_then(|cache| cache.get(key)) {
        return Some(lines);
    }

    let syn_theme = THEME_SET
        .themes
        .get(theme_name)
        .or_else(|| THEME_SET.themes.values().next())?;
    let syntax = SYNTAX_SET
        .find_syntax_by_token(&lang)
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, syn_theme);
    let bg = theme.md_codeblock_bg_color();

    let mut out = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, &SYNTAX_SET).ok()?;
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .map(|(style, text)| {
                let fg = style.foreground;
                let mut st = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
                if let Some(bg) = bg {
                    st = st.bg(bg);
                }
                Span::styled(text.trim_end_matches('\n').to_string(), st)
            })
            .collect();
        out.push(Line::from(spans));
    }

    if let Ok(mut cache) = CACHE.lock() {
        cache.put(key, out.clone());
    }
    Some(out)
}
