//! Request handlers for the proxy routes.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::api::{AskRequest, AskResponse};
use crate::core::backend::BackendError;
use crate::server::AppState;

pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const MESSAGE_REQUIRED: &str = "Message is required";

type Reply = (StatusCode, Json<AskResponse>);

fn reply(status: StatusCode, answer: impl Into<String>) -> Reply {
    (status, Json(AskResponse::answer(answer)))
}

/// POST /api/{backend}
///
/// The body is parsed leniently: anything that does not yield a non-blank
/// `message` is a 400, never a JSON rejection.
pub async fn ask(
    State(state): State<AppState>,
    Path(backend_id): Path<String>,
    body: Bytes,
) -> Reply {
    let Some(backend) = state.backend(&backend_id) else {
        warn!(backend = %backend_id, "unknown backend requested");
        return reply(
            StatusCode::NOT_FOUND,
            format!("Unknown backend: {backend_id}"),
        );
    };

    let request = serde_json::from_slice::<AskRequest>(&body).unwrap_or_default();
    let Some(question) = request.question() else {
        debug!(backend = %backend_id, bytes = body.len(), "rejecting request without message");
        return reply(StatusCode::BAD_REQUEST, MESSAGE_REQUIRED);
    };

    let outcome = match request.conversation_id.as_deref() {
        Some(conversation_id) => backend.answer_in(question, conversation_id).await,
        None => backend.answer(question).await,
    };
    match outcome {
        Ok(answer) => reply(StatusCode::OK, answer),
        Err(BackendError::EmptyQuestion) => reply(StatusCode::BAD_REQUEST, MESSAGE_REQUIRED),
        Err(err) => {
            error!(backend = %backend_id, error = %err, "backend failed without an answer");
            let reason = err.reason();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AskResponse {
                    answer: reason.clone(),
                    error: Some(reason),
                }),
            )
        }
    }
}

pub async fn method_not_allowed() -> Reply {
    reply(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backends": state.backend_ids(),
    }))
}
