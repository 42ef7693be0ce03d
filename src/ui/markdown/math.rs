//! `$$..$$` / `$..$` segmentation and formula checking.

use std::error::Error;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::Inline;

static BLOCK_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$(.*?)\$\$").expect("block math regex is invalid"));
static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(.*?)\$").expect("inline math regex is invalid"));

/// Splits `text` into plain runs and math runs.
///
/// Display math is looked for first; a line holding any `$$..$$` is not
/// scanned for inline math at all.
pub fn segment(text: &str) -> Vec<Inline> {
    let block = split_on(&BLOCK_MATH, text, true);
    if block.iter().any(is_math) {
        return block;
    }
    split_on(&INLINE_MATH, text, false)
}

fn is_math(inline: &Inline) -> bool {
    matches!(inline, Inline::Math { .. })
}

fn split_on(pattern: &Regex, text: &str, display: bool) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Inline::Text(text[last..whole.start()].to_string()));
        }
        out.push(Inline::Math {
            tex: inner.as_str().to_string(),
            display,
        });
        last = whole.end();
    }
    if last < text.len() {
        out.push(Inline::Text(text[last..].to_string()));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TexError {
    UnbalancedBraces,
    UnmatchedLeftRight { left: usize, right: usize },
    UnmatchedEnvironment(String),
    TrailingBackslash,
}

impl fmt::Display for TexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TexError::UnbalancedBraces => write!(f, "unbalanced braces"),
            TexError::UnmatchedLeftRight { left, right } => {
                write!(f, "{left} \\left against {right} \\right")
            }
            TexError::UnmatchedEnvironment(name) => write!(f, "unmatched environment {name}"),
            TexError::TrailingBackslash => write!(f, "trailing backslash"),
        }
    }
}

impl Error for TexError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathOutput {
    Rendered(String),
    /// The formula text to show in place of the rendering.
    Error(String),
}

/// Turns a formula into display markup.
pub trait MathRenderer: Send + Sync {
    fn render(&self, tex: &str, display: bool) -> MathOutput;
}

/// Text shown for a formula that failed to render.
pub fn error_text(tex: &str, display: bool) -> String {
    if display {
        format!("[Formula error: {tex}]")
    } else {
        format!("({tex})")
    }
}

/// Structural TeX checks, emitting KaTeX auto-render delimiters.
///
/// Typesetting happens in the browser; only formulas that would make KaTeX
/// throw on structure are turned into errors here.
#[derive(Debug, Default, Clone, Copy)]
pub struct TexChecker;

impl TexChecker {
    pub fn check(tex: &str) -> Result<(), TexError> {
        let mut depth: i64 = 0;
        let mut environments: Vec<String> = Vec::new();
        let mut left = 0;
        let mut right = 0;

        let bytes = tex.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    let start = i + 1;
                    if start >= bytes.len() {
                        return Err(TexError::TrailingBackslash);
                    }
                    let mut end = start;
                    while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
                        end += 1;
                    }
                    if end == start {
                        // Escaped symbol such as \{ or \\.
                        i = start + 1;
                        continue;
                    }
                    match &tex[start..end] {
                        "left" => left += 1,
                        "right" => right += 1,
                        "begin" => environments.push(environment_name(&tex[end..])),
                        "end" => {
                            let name = environment_name(&tex[end..]);
                            if environments.pop().as_deref() != Some(name.as_str()) {
                                return Err(TexError::UnmatchedEnvironment(name));
                            }
                        }
                        _ => {}
                    }
                    i = end;
                    continue;
                }
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(TexError::UnbalancedBraces);
                    }
                }
                _ => {}
            }
            i += 1;
        }

        if depth != 0 {
            return Err(TexError::UnbalancedBraces);
        }
        if left != right {
            return Err(TexError::UnmatchedLeftRight { left, right });
        }
        if let Some(open) = environments.pop() {
            return Err(TexError::UnmatchedEnvironment(open));
        }
        Ok(())
    }
}

fn environment_name(after_command: &str) -> String {
    after_command
        .trim_start()
        .strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .map(|(name, _)| name.trim().to_string())
        .unwrap_or_default()
}

impl MathRenderer for TexChecker {
    fn render(&self, tex: &str, display: bool) -> MathOutput {
        match Self::check(tex) {
            Ok(()) if display => MathOutput::Rendered(format!("\\[{tex}\\]")),
            Ok(()) => MathOutput::Rendered(format!("\\({tex}\\)")),
            Err(err) => {
                tracing::debug!(%tex, error = %err, "formula rejected");
                MathOutput::Error(error_text(tex, display))
            }
        }
    }
}

/// Best-effort Unicode rendering of common commands for plain terminals.
pub fn to_unicode(tex: &str) -> String {
    const SYMBOLS: &[(&str, &str)] = &[
        ("\\alpha", "α"),
        ("\\beta", "β"),
        ("\\gamma", "γ"),
        ("\\delta", "δ"),
        ("\\epsilon", "ε"),
        ("\\theta", "θ"),
        ("\\lambda", "λ"),
        ("\\mu", "μ"),
        ("\\pi", "π"),
        ("\\sigma", "σ"),
        ("\\phi", "φ"),
        ("\\omega", "ω"),
        ("\\Delta", "Δ"),
        ("\\Sigma", "Σ"),
        ("\\Omega", "Ω"),
        ("\\infty", "∞"),
        ("\\sum", "∑"),
        ("\\prod", "∏"),
        ("\\int", "∫"),
        ("\\partial", "∂"),
        ("\\nabla", "∇"),
        ("\\sqrt", "√"),
        ("\\times", "×"),
        ("\\cdot", "·"),
        ("\\pm", "±"),
        ("\\leq", "≤"),
        ("\\geq", "≥"),
        ("\\neq", "≠"),
        ("\\approx", "≈"),
        ("\\rightarrow", "→"),
        ("\\to", "→"),
        ("\\in", "∈"),
    ];

    let mut out = String::with_capacity(tex.len());
    let mut rest = tex;
    'outer: while !rest.is_empty() {
        if rest.starts_with('\\') {
            for (command, symbol) in SYMBOLS {
                if let Some(after) = rest.strip_prefix(command) {
                    // \in must not eat the start of \infty, \int ...
                    if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                        continue;
                    }
                    out.push_str(symbol);
                    rest = after;
                    continue 'outer;
                }
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn math(tex: &str, display: bool) -> Inline {
        Inline::Math {
            tex: tex.to_string(),
            display,
        }
    }

    #[test]
    fn block_math_alone() {
        assert_eq!(segment("$$x^2$$"), vec![math("x^2", true)]);
    }

    #[test]
    fn inline_math_alternates_with_text() {
        assert_eq!(
            segment("a $x$ b $y$ c"),
            vec![
                text("a "),
                math("x", false),
                text(" b "),
                math("y", false),
                text(" c"),
            ]
        );
    }

    #[test]
    fn block_math_suppresses_inline_scan() {
        assert_eq!(
            segment("$$E$$ and $m$"),
            vec![math("E", true), text(" and $m$")]
        );
    }

    #[test]
    fn plain_text_is_returned_unchanged() {
        assert_eq!(segment("no math here"), vec![text("no math here")]);
        assert!(segment("").is_empty());
    }

    #[test]
    fn lone_dollar_stays_text() {
        assert_eq!(segment("costs $5"), vec![text("costs $5")]);
    }

    #[test]
    fn double_dollar_without_block_match_is_empty_inline() {
        assert_eq!(
            segment("a $$ b"),
            vec![text("a "), math("", false), text(" b")]
        );
    }

    #[test]
    fn checker_accepts_well_formed_formulas() {
        for tex in [
            "x^2",
            "\\frac{a}{b}",
            "\\left( \\frac{1}{2} \\right)",
            "\\{ x \\}",
            "\\begin{matrix} a & b \\\\ c & d \\end{matrix}",
            "",
        ] {
            assert_eq!(TexChecker::check(tex), Ok(()), "{tex}");
        }
    }

    #[test]
    fn checker_rejects_structural_errors() {
        assert_eq!(
            TexChecker::check("\\frac{a}{b"),
            Err(TexError::UnbalancedBraces)
        );
        assert_eq!(TexChecker::check("a}{"), Err(TexError::UnbalancedBraces));
        assert_eq!(
            TexChecker::check("\\left( x"),
            Err(TexError::UnmatchedLeftRight { left: 1, right: 0 })
        );
        assert_eq!(
            TexChecker::check("\\begin{cases} x \\end{matrix}"),
            Err(TexError::UnmatchedEnvironment("matrix".into()))
        );
        assert_eq!(TexChecker::check("x\\"), Err(TexError::TrailingBackslash));
    }

    #[test]
    fn errors_degrade_differently_per_mode() {
        let renderer = TexChecker;
        assert_eq!(
            renderer.render("\\frac{1}{", true),
            MathOutput::Error("[Formula error: \\frac{1}{]".into())
        );
        assert_eq!(
            renderer.render("\\frac{1}{", false),
            MathOutput::Error("(\\frac{1}{)".into())
        );
        assert_eq!(
            renderer.render("x", false),
            MathOutput::Rendered("\\(x\\)".into())
        );
    }

    #[test]
    fn unicode_rendering_maps_known_commands() {
        assert_eq!(to_unicode("\\alpha + \\beta"), "α + β");
        assert_eq!(to_unicode("\\int_0^\\infty"), "∫_0^∞");
        assert_eq!(to_unicode("x \\in A"), "x ∈ A");
        assert_eq!(to_unicode("\\unknown"), "\\unknown");
    }
}
