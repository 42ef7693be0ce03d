use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::*;
use crate::api::ChatRequest;
use crate::core::builtin_backends::find_builtin_backend;
use crate::core::credentials::StaticCredentials;

type Script = Arc<dyn Fn(&str) -> (u16, Value) + Send + Sync>;

#[derive(Clone)]
struct FakeVendor {
    models: Arc<Mutex<Vec<String>>>,
    auth: Arc<Mutex<Vec<String>>>,
    script: Script,
}

async fn completions(
    State(vendor): State<FakeVendor>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> (StatusCode, Json<Value>) {
    vendor.models.lock().unwrap().push(request.model.clone());
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        vendor.auth.lock().unwrap().push(auth.to_string());
    }
    let (status, body) = (vendor.script)(&request.model);
    (StatusCode::from_u16(status).unwrap(), Json(body))
}

/// Starts a local stand-in for the vendor API; returns its base URL.
async fn spawn_vendor(
    script: impl Fn(&str) -> (u16, Value) + Send + Sync + 'static,
) -> (String, FakeVendor) {
    let vendor = FakeVendor {
        models: Arc::default(),
        auth: Arc::default(),
        script: Arc::new(script),
    };
    let app = Router::new()
        .route("/chat/completions", post(completions))
        .with_state(vendor.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), vendor)
}

fn answer_body(text: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

fn error_body(message: &str) -> Value {
    json!({ "error": { "message": message } })
}

fn backend(id: &str, base_url: &str, with_key: bool) -> VendorBackend {
    let meta = find_builtin_backend(id).unwrap();
    let creds = if with_key {
        StaticCredentials::default().with_key(id, "test-key")
    } else {
        StaticCredentials::default()
    };
    VendorBackend::new(meta, reqwest::Client::new(), Arc::new(creds)).with_base_url(base_url)
}

#[tokio::test]
async fn single_model_backend_makes_one_authenticated_call() {
    let (url, vendor) = spawn_vendor(|_| (200, answer_body("4"))).await;
    let deepseek = backend("deepseek", &url, true);

    let answer = deepseek.answer("2+2?").await.unwrap();

    assert_eq!(answer, "4");
    assert_eq!(*vendor.models.lock().unwrap(), vec!["deepseek-chat"]);
    assert_eq!(*vendor.auth.lock().unwrap(), vec!["Bearer test-key"]);
}

#[tokio::test]
async fn empty_question_never_reaches_the_vendor() {
    let (url, vendor) = spawn_vendor(|_| (200, answer_body("unused"))).await;
    let deepseek = backend("deepseek", &url, true);

    let result = deepseek.answer("   ").await;

    assert!(matches!(result, Err(BackendError::EmptyQuestion)));
    assert!(vendor.models.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_key_becomes_markdown_answer() {
    let (url, vendor) = spawn_vendor(|_| (200, answer_body("unused"))).await;
    let groq = backend("groq", &url, false);

    let answer = groq.answer("hello there").await.unwrap();

    assert!(answer.starts_with("# Service error"));
    assert!(answer.contains("GROQ_API_KEY"));
    assert!(answer.contains("\"hello there\""));
    assert!(vendor.models.lock().unwrap().is_empty());
}

#[tokio::test]
async fn payment_required_yields_recharge_document() {
    let (url, _vendor) = spawn_vendor(|_| (402, error_body("Insufficient Balance"))).await;
    let deepseek = backend("deepseek", &url, true);

    let raw = deepseek.complete("q").await;
    assert!(matches!(raw, Err(BackendError::InsufficientBalance { .. })));

    let answer = deepseek.answer("q").await.unwrap();
    assert!(answer.contains("Insufficient balance on your DeepSeek account"));
    assert!(answer.contains("Top up your account"));
}

#[tokio::test]
async fn single_model_backend_does_not_fall_back() {
    let (url, vendor) = spawn_vendor(|_| (400, error_body("model not found"))).await;
    let deepseek = backend("deepseek", &url, true);

    let err = deepseek.complete("q").await.unwrap_err();

    assert!(matches!(err, BackendError::Upstream { status: 400, .. }));
    assert_eq!(vendor.models.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn fallback_backend_walks_models_in_declared_order() {
    let (url, vendor) = spawn_vendor(|model| match model {
        "mixtral-8x7b-32768" => (200, answer_body("from mixtral")),
        other => (
            400,
            error_body(&format!("The model `{other}` has been decommissioned")),
        ),
    })
    .await;
    let groq = backend("groq", &url, true);

    let answer = groq.answer("q").await.unwrap();

    assert_eq!(answer, "from mixtral");
    assert_eq!(
        *vendor.models.lock().unwrap(),
        vec![
            "llama-3.1-70b-versatile",
            "llama-3.1-8b-instant",
            "mixtral-8x7b-32768"
        ]
    );
}

#[tokio::test]
async fn fallback_backend_stops_on_non_model_rejection() {
    let (url, vendor) = spawn_vendor(|_| (401, error_body("Invalid API Key"))).await;
    let groq = backend("groq", &url, true);

    let err = groq.complete("q").await.unwrap_err();

    assert!(matches!(err, BackendError::Upstream { status: 401, .. }));
    assert_eq!(*vendor.models.lock().unwrap(), vec!["llama-3.1-70b-versatile"]);
}

#[tokio::test]
async fn fallback_exhaustion_names_last_reason() {
    let (url, vendor) = spawn_vendor(|model| {
        (400, error_body(&format!("The model `{model}` does not exist")))
    })
    .await;
    let groq = backend("groq", &url, true);

    let answer = groq.answer("still there?").await.unwrap();

    assert_eq!(vendor.models.lock().unwrap().len(), 4);
    assert!(answer
        .contains("All models failed. Last error: The model `gemma2-9b-it` does not exist"));
    assert!(answer.contains("\"still there?\""));
}

#[tokio::test]
async fn empty_choices_use_fixed_apology() {
    let (url, _vendor) = spawn_vendor(|_| (200, json!({ "choices": [] }))).await;
    let deepseek = backend("deepseek", &url, true);

    let answer = deepseek.answer("q").await.unwrap();

    assert_eq!(answer, upstream::NO_ANSWER);
}

#[test]
fn invalid_model_detection_requires_status_and_wording() {
    let model_400 = BackendError::Upstream {
        status: 400,
        message: "model decommissioned".into(),
    };
    let other_400 = BackendError::Upstream {
        status: 400,
        message: "max_tokens too large".into(),
    };
    let model_500 = BackendError::Upstream {
        status: 500,
        message: "model crashed".into(),
    };
    let not_found = BackendError::Upstream {
        status: 404,
        message: "model not found".into(),
    };
    assert!(model_400.is_invalid_model());
    assert!(!not_found.is_invalid_model());
    assert!(!other_400.is_invalid_model());
    assert!(!model_500.is_invalid_model());
}
