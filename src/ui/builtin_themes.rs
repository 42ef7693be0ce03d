use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeSpec {
    pub id: String,
    pub display_name: String,
    pub primary: String,
    pub background: String,
}

#[derive(Debug, Deserialize)]
struct BuiltinThemesConfig {
    themes: Vec<ThemeSpec>,
}

pub fn load_builtin_themes() -> Vec<ThemeSpec> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_themes.toml");
    let config: BuiltinThemesConfig =
        toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_themes.toml");
    config.themes
}

pub fn find_builtin_theme(id: &str) -> Option<ThemeSpec> {
    load_builtin_themes()
        .into_iter()
        .find(|t| t.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_has_expected_builtins() {
        let ids: Vec<String> = load_builtin_themes().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["dark", "blue", "green"]);
    }

    #[test]
    fn find_builtin_theme_works_case_insensitive() {
        let t = find_builtin_theme("BlUe").expect("should find 'blue'");
        assert_eq!(t.display_name, "Bleu nuit");
    }
}
