//! Wire payloads for the proxy endpoints and the vendor chat-completion APIs.

use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";

/// Body accepted by `POST /api/<backend>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(default, alias = "question")]
    pub message: Option<String>,
    #[serde(
        default,
        rename = "conversationId",
        skip_serializing_if = "Option::is_none"
    )]
    pub conversation_id: Option<String>,
}

impl AskRequest {
    pub fn new(message: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            message: Some(message.into()),
            conversation_id,
        }
    }

    /// The question, if present and not blank.
    pub fn question(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }
}

/// Body returned by the proxy endpoints. `answer` is always markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AskResponse {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            content: content.into(),
        }
    }
}

/// Non-streaming chat-completion request shared by DeepSeek and Groq.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

impl ChatCompletion {
    /// Content of the first choice, if the vendor returned any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

/// Pulls a human-readable reason out of a vendor error body.
///
/// Vendors nest the reason under `error.message`; some return `error` as a
/// bare string or put `message` at the top level.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| value.get("error").and_then(|v| v.as_str().map(str::to_owned)))
        .or_else(|| value.get("message").and_then(|v| v.as_str().map(str::to_owned)))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_request_accepts_question_alias() {
        let request: AskRequest =
            serde_json::from_str(r#"{"question":"hi","conversationId":"42"}"#).unwrap();
        assert_eq!(request.question(), Some("hi"));
        assert_eq!(request.conversation_id.as_deref(), Some("42"));
    }

    #[test]
    fn blank_message_is_not_a_question() {
        let request: AskRequest = serde_json::from_str(r#"{"message":"   "}"#).unwrap();
        assert_eq!(request.question(), None);
        let request: AskRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.question(), None);
    }

    #[test]
    fn chat_request_serializes_vendor_fields() {
        let request = ChatRequest {
            model: "deepseek-chat".into(),
            messages: vec![ChatMessage::user("2+2?")],
            max_tokens: 2000,
            temperature: 0.7,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "deepseek-chat");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "2+2?");
        assert_eq!(value["max_tokens"], 2000);
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn first_content_skips_missing_and_empty() {
        let completion: ChatCompletion =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"4"}}]}"#).unwrap();
        assert_eq!(completion.first_content(), Some("4"));

        let completion: ChatCompletion = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(completion.first_content(), None);

        let completion: ChatCompletion =
            serde_json::from_str(r#"{"choices":[{"message":{"content":""}}]}"#).unwrap();
        assert_eq!(completion.first_content(), None);
    }

    #[test]
    fn extracts_nested_and_flat_error_messages() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"The model `x` does not exist"}}"#)
                .as_deref(),
            Some("The model `x` does not exist")
        );
        assert_eq!(
            extract_error_message(r#"{"error":"bad  key"}"#).as_deref(),
            Some("bad key")
        );
        assert_eq!(
            extract_error_message(r#"{"message":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(extract_error_message("<html>"), None);
    }
}
