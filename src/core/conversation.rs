use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One question and the markdown answer it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRecord {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    pub conversation_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Fr,
    En,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }

    /// BCP 47 tag used for speech output.
    pub fn speech_tag(self) -> &'static str {
        match self {
            Language::Fr => "fr-FR",
            Language::En => "en-US",
        }
    }
}

impl TryFrom<&str> for Language {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fr" | "french" | "français" => Ok(Language::Fr),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("Unknown language '{other}' (expected fr or en)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Dark,
    Blue,
    Green,
}

impl ThemeChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeChoice::Dark => "dark",
            ThemeChoice::Blue => "blue",
            ThemeChoice::Green => "green",
        }
    }
}

impl TryFrom<&str> for ThemeChoice {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeChoice::Dark),
            "blue" => Ok(ThemeChoice::Blue),
            "green" => Ok(ThemeChoice::Green),
            other => Err(format!(
                "Unknown theme '{other}' (expected dark, blue or green)"
            )),
        }
    }
}

/// Process-wide preferences, persisted after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub dark_mode: bool,
    pub language: Language,
    pub theme: ThemeChoice,
    /// Conversation the client appends to; absent until one is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_conversation: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            language: Language::Fr,
            theme: ThemeChoice::Dark,
            current_conversation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_use_camel_case_fields() {
        let record = ExchangeRecord {
            id: "1700000000000".into(),
            question: "q".into(),
            answer: "a".into(),
            timestamp: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            conversation_id: "c1".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["conversationId"], "c1");
        assert!(value.get("conversation_id").is_none());
    }

    #[test]
    fn settings_parse_original_shape() {
        let settings: Settings =
            serde_json::from_str(r#"{"darkMode":false,"language":"en","theme":"green"}"#)
                .unwrap();
        assert!(!settings.dark_mode);
        assert_eq!(settings.language, Language::En);
        assert_eq!(settings.theme, ThemeChoice::Green);
        assert_eq!(settings.current_conversation, None);
    }

    #[test]
    fn parses_language_and_theme_names() {
        assert_eq!(Language::try_from("EN"), Ok(Language::En));
        assert!(Language::try_from("de").is_err());
        assert_eq!(ThemeChoice::try_from(" Blue "), Ok(ThemeChoice::Blue));
        assert!(ThemeChoice::try_from("purple").is_err());
    }
}
