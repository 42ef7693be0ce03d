//! Markdown documents shown in place of an answer when a call fails.
//!
//! Every document restates the question so the user can resubmit it later.

use crate::core::backend::BackendError;
use crate::core::builtin_backends::BuiltinBackend;

/// Picks the document matching a backend failure.
pub fn failure_document(backend: &BuiltinBackend, err: &BackendError, question: &str) -> String {
    match err {
        BackendError::InsufficientBalance { .. } => insufficient_balance(backend, question),
        other => service_unavailable(backend, &other.to_string(), question),
    }
}

pub fn service_unavailable(backend: &BuiltinBackend, detail: &str, question: &str) -> String {
    format!(
        "# Service error\n\n\
**Sorry, the {name} service is temporarily unavailable.**\n\n\
## Technical details:\n\n\
- Error: {detail}\n\
- Status: Please try again in a few moments\n\n\
## Your question: \"{question}\"\n\n\
*The service should be back shortly.*",
        name = backend.display_name,
    )
}

pub fn insufficient_balance(backend: &BuiltinBackend, question: &str) -> String {
    format!(
        "# Service error\n\n\
**Insufficient balance on your {name} account**\n\n\
## Problem identified:\n\n\
- Your {name} account does not have enough credit\n\
- Error code: 402 - Insufficient Balance\n\n\
## Solution:\n\n\
1. **Sign in** to your [{name}]({billing}) account\n\
2. **Check your balance** in the billing section\n\
3. **Top up your account** if needed\n\
4. **Try again** after topping up\n\n\
**Your question:** \"{question}\"\n\n\
*This question can be answered once your account has been topped up.*",
        name = backend.display_name,
        billing = backend.billing_url,
    )
}

/// Answer recorded when the client could not reach any backend at all.
pub fn connection_error(detail: &str, question: &str) -> String {
    format!(
        "# Connection error\n\n\
**Sorry, the assistant could not be reached.**\n\n\
**Error details:** {detail}\n\n\
Please check:\n\n\
1. Your internet connection\n\
2. That your API key is valid\n\
3. Try again in a few moments\n\n\
**Your question:** \"{question}\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builtin_backends::find_builtin_backend;

    #[test]
    fn balance_document_has_recharge_steps_and_question() {
        let deepseek = find_builtin_backend("deepseek").unwrap();
        let err = BackendError::InsufficientBalance {
            message: "Insufficient Balance".into(),
        };
        let doc = failure_document(&deepseek, &err, "What is 2+2?");
        assert!(doc.contains("Insufficient balance on your DeepSeek account"));
        assert!(doc.contains("[DeepSeek](https://platform.deepseek.com/)"));
        assert!(doc.contains("4. **Try again**"));
        assert!(doc.contains("**Your question:** \"What is 2+2?\""));
    }

    #[test]
    fn generic_document_embeds_error_detail() {
        let groq = find_builtin_backend("groq").unwrap();
        let err = BackendError::AllModelsFailed {
            last_reason: "model gone".into(),
        };
        let doc = failure_document(&groq, &err, "hello");
        assert!(doc.starts_with("# Service error"));
        assert!(doc.contains("Groq service is temporarily unavailable"));
        assert!(doc.contains("- Error: All models failed. Last error: model gone"));
        assert!(doc.contains("## Your question: \"hello\""));
        assert!(!doc.contains("Insufficient balance"));
    }

    #[test]
    fn connection_error_restates_question() {
        let doc = connection_error("HTTP 502: bad gateway", "ping");
        assert!(doc.contains("**Error details:** HTTP 502: bad gateway"));
        assert!(doc.ends_with("**Your question:** \"ping\""));
    }
}
