use crate::core::conversation::{Settings, ThemeChoice};
use crate::ui::builtin_themes::{find_builtin_theme, ThemeSpec};
use ratatui::style::{Color, Modifier, Style};

const BLUE_600: Color = Color::Rgb(0x25, 0x63, 0xeb);
const BLUE_400: Color = Color::Rgb(0x60, 0xa5, 0xfa);
const GREEN_600: Color = Color::Rgb(0x16, 0xa3, 0x4a);
const GREEN_400: Color = Color::Rgb(0x4a, 0xde, 0x80);
const PURPLE_600: Color = Color::Rgb(0x93, 0x33, 0xea);
const PURPLE_400: Color = Color::Rgb(0xc0, 0x84, 0xfc);
const GRAY_100: Color = Color::Rgb(0xf3, 0xf4, 0xf6);
const GRAY_400: Color = Color::Rgb(0x9c, 0xa3, 0xaf);
const GRAY_500: Color = Color::Rgb(0x6b, 0x72, 0x80);
const GRAY_600: Color = Color::Rgb(0x4b, 0x55, 0x63);
const GRAY_800: Color = Color::Rgb(0x1f, 0x29, 0x37);
const GRAY_900: Color = Color::Rgb(0x11, 0x18, 0x27);
const RED_500: Color = Color::Rgb(0xef, 0x44, 0x44);

#[derive(Debug, Clone)]
pub struct Theme {
    // Overall background color to paint the full frame
    pub background_color: Color,
    pub text_style: Style,
    pub user_prefix_style: Style,
    /// Levels 1 to 3
    pub heading_styles: [Style; 3],
    pub bold_style: Style,
    pub link_style: Style,
    pub quote_bar_style: Style,
    pub quote_text_style: Style,
    pub inline_code_style: Style,
    pub md_codeblock_text: Style,
    pub md_codeblock_bg: Option<Color>,
    pub math_style: Style,
    pub math_error_style: Style,
    pub list_marker_style: Style,
    pub divider_style: Style,
    pub caption_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Self::from_choice(ThemeChoice::Dark, true)
    }

    pub fn light() -> Self {
        Self::from_choice(ThemeChoice::Dark, false)
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::from_choice(settings.theme, settings.dark_mode)
    }

    pub fn from_choice(choice: ThemeChoice, dark_mode: bool) -> Self {
        // Prefer built-in spec for consistent RGB colors
        if let Some(spec) = find_builtin_theme(choice.as_str()) {
            return Self::from_spec(&spec, dark_mode);
        }
        Self::palette(Color::Blue, Color::Black, dark_mode)
    }

    pub fn from_spec(spec: &ThemeSpec, dark_mode: bool) -> Self {
        let primary = parse_color(&spec.primary).unwrap_or(Color::Blue);
        let background = parse_color(&spec.background).unwrap_or(Color::Black);
        Self::palette(primary, background, dark_mode)
    }

    fn palette(primary: Color, background: Color, dark_mode: bool) -> Self {
        // Light mode keeps only the accent; the page is white.
        let (bg, fg, muted, strong, code_bg) = if dark_mode {
            (background, Color::White, GRAY_400, Color::White, GRAY_800)
        } else {
            (Color::White, GRAY_800, GRAY_600, GRAY_900, GRAY_100)
        };
        let [h1, h2, h3] = if dark_mode {
            [BLUE_400, GREEN_400, PURPLE_400]
        } else {
            [BLUE_600, GREEN_600, PURPLE_600]
        };
        let bold = Style::default().add_modifier(Modifier::BOLD);

        Theme {
            background_color: bg,
            text_style: Style::default().fg(fg),
            user_prefix_style: bold.fg(primary),
            heading_styles: [bold.fg(h1), bold.fg(h2), bold.fg(h3)],
            bold_style: bold.fg(strong),
            link_style: Style::default()
                .fg(primary)
                .add_modifier(Modifier::UNDERLINED),
            quote_bar_style: Style::default().fg(primary),
            quote_text_style: Style::default()
                .fg(muted)
                .add_modifier(Modifier::ITALIC),
            inline_code_style: Style::default().fg(fg).bg(code_bg),
            md_codeblock_text: Style::default().fg(fg),
            md_codeblock_bg: Some(code_bg),
            math_style: Style::default().fg(primary).add_modifier(Modifier::ITALIC),
            math_error_style: Style::default().fg(RED_500),
            list_marker_style: Style::default().fg(primary),
            divider_style: Style::default().fg(GRAY_500),
            caption_style: Style::default().fg(GRAY_500),
        }
    }

    pub fn heading_style(&self, level: u8) -> Style {
        let index = usize::from(level.clamp(1, 3)) - 1;
        self.heading_styles[index]
    }

    pub fn md_codeblock_text_style(&self) -> Style {
        self.md_codeblock_text
    }

    pub fn md_codeblock_bg_color(&self) -> Option<Color> {
        self.md_codeblock_bg
    }
}

/// Parses `#rgb`, `#rrggbb` or a basic color name.
pub fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex);
    }
    match lower.as_str() {
        "black" => Some(Color::Black),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "blue" => Some(Color::Blue),
        "cyan" => Some(Color::Cyan),
        "magenta" => Some(Color::Magenta),
        "yellow" => Some(Color::Yellow),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if hex.len() == 3 {
        let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
        let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
        let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if hex.len() == 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_color("#1D4ED8"), Some(Color::Rgb(0x1d, 0x4e, 0xd8)));
        assert_eq!(parse_color("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("teal"), None);
    }

    #[test]
    fn dark_mode_uses_palette_background() {
        let blue = Theme::from_choice(ThemeChoice::Blue, true);
        assert_eq!(blue.background_color, Color::Rgb(0x0f, 0x17, 0x2a));
        assert_eq!(blue.list_marker_style.fg, Some(Color::Rgb(0x1d, 0x4e, 0xd8)));

        let green_light = Theme::from_choice(ThemeChoice::Green, false);
        assert_eq!(green_light.background_color, Color::White);
        assert_eq!(
            green_light.list_marker_style.fg,
            Some(Color::Rgb(0x05, 0x96, 0x69))
        );
    }

    #[test]
    fn settings_select_theme() {
        let settings = Settings {
            dark_mode: false,
            theme: ThemeChoice::Green,
            ..Settings::default()
        };
        assert_eq!(Theme::from_settings(&settings).background_color, Color::White);
        assert_eq!(Theme::dark_default().background_color, Color::Rgb(0x1f, 0x29, 0x37));
    }

    #[test]
    fn heading_levels_clamp() {
        let theme = Theme::light();
        assert_eq!(theme.heading_style(0), theme.heading_styles[0]);
        assert_eq!(theme.heading_style(9), theme.heading_styles[2]);
        assert_eq!(theme.heading_style(1).fg, Some(BLUE_600));
    }
}
