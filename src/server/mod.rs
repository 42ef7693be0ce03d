//! HTTP proxy in front of the vendor adapters.
//!
//! `POST /api/{backend}` forwards `{"message": …}` to the named backend and
//! always answers with `{"answer": …}`; vendor failures come back as markdown
//! with status 200 so the client can display them like any other answer.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::core::backend::{Backend, VendorBackend};
use crate::core::builtin_backends::load_builtin_backends;
use crate::core::config::Config;
use crate::core::credentials::CredentialSource;

pub mod handlers;
pub mod router;

pub use router::build_router;

/// Shared state handed to every handler.
#[derive(Clone, Default)]
pub struct AppState {
    backends: Arc<HashMap<String, Arc<dyn Backend>>>,
}

impl AppState {
    pub fn new(backends: impl IntoIterator<Item = Arc<dyn Backend>>) -> Self {
        let backends = backends
            .into_iter()
            .map(|backend| (backend.id().to_ascii_lowercase(), backend))
            .collect();
        Self {
            backends: Arc::new(backends),
        }
    }

    /// One [`VendorBackend`] per catalog entry, with `base_url` overrides applied.
    pub fn from_config(
        config: &Config,
        http: reqwest::Client,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        let backends = load_builtin_backends().into_iter().map(|meta| {
            let base_url = config.base_url_for(&meta.id).map(str::to_string);
            let mut backend = VendorBackend::new(meta, http.clone(), credentials.clone());
            if let Some(url) = base_url {
                backend = backend.with_base_url(url);
            }
            Arc::new(backend) as Arc<dyn Backend>
        });
        Self::new(backends)
    }

    pub fn backend(&self, id: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(&id.to_ascii_lowercase()).cloned()
    }

    pub fn backend_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.backends.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Binds `config.bind` and serves until Ctrl+C.
pub async fn serve(config: &Config, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr().to_string();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, backends = ?state.backend_ids(), "proxy listening");
    println!("duochat proxy listening on http://{addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
