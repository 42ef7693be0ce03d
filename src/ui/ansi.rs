//! Printing rendered lines outside of a ratatui frame.

use ratatui::crossterm::style::{
    Attribute, Color as CColor, ContentStyle, StyledContent,
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;

fn to_crossterm(color: Color) -> CColor {
    match color {
        Color::Reset => CColor::Reset,
        Color::Black => CColor::Black,
        Color::Red => CColor::DarkRed,
        Color::Green => CColor::DarkGreen,
        Color::Yellow => CColor::DarkYellow,
        Color::Blue => CColor::DarkBlue,
        Color::Magenta => CColor::DarkMagenta,
        Color::Cyan => CColor::DarkCyan,
        Color::Gray => CColor::Grey,
        Color::DarkGray => CColor::DarkGrey,
        Color::LightRed => CColor::Red,
        Color::LightGreen => CColor::Green,
        Color::LightYellow => CColor::Yellow,
        Color::LightBlue => CColor::Blue,
        Color::LightMagenta => CColor::Magenta,
        Color::LightCyan => CColor::Cyan,
        Color::White => CColor::White,
        Color::Rgb(r, g, b) => CColor::Rgb { r, g, b },
        Color::Indexed(i) => CColor::AnsiValue(i),
    }
}

fn content_style(style: Style) -> ContentStyle {
    let mut out = ContentStyle::new();
    out.foreground_color = style.fg.map(to_crossterm);
    out.background_color = style.bg.map(to_crossterm);
    for (modifier, attribute) in [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::DIM, Attribute::Dim),
    ] {
        if style.add_modifier.contains(modifier) {
            out.attributes.set(attribute);
        }
    }
    out
}

/// One line with ANSI escapes, or plain text when `color` is off.
pub fn line_to_string(line: &Line<'_>, color: bool) -> String {
    if !color {
        return line.to_string();
    }
    line.spans
        .iter()
        .map(|span| {
            let style = line.style.patch(span.style);
            StyledContent::new(content_style(style), span.content.as_ref()).to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::text::Span;

    #[test]
    fn plain_output_has_no_escapes() {
        let line = Line::from(vec![
            Span::styled("a", Style::default().fg(Color::Red)),
            Span::raw("b"),
        ]);
        assert_eq!(line_to_string(&line, false), "ab");
    }

    #[test]
    fn colored_output_keeps_text_and_adds_escapes() {
        let line = Line::from(Span::styled(
            "hi",
            Style::default()
                .fg(Color::Rgb(1, 2, 3))
                .add_modifier(Modifier::BOLD),
        ));
        let out = line_to_string(&line, true);
        assert!(out.contains("hi"));
        assert!(out.contains("\u{1b}["));
        assert!(out.contains("38;2;1;2;3"));
    }
}
