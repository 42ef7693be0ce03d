use std::future::Future;

use tracing::{info, warn};

use crate::core::backend::BackendError;

/// Tries each model in order until one is accepted.
///
/// A rejection of the model name advances to the next candidate; any other
/// failure is returned immediately. When every candidate is rejected the
/// last rejection reason is reported.
pub async fn first_accepted_model<F, Fut>(
    models: &[String],
    mut attempt: F,
) -> Result<String, BackendError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, BackendError>>,
{
    let mut last_reason: Option<String> = None;

    for model in models {
        info!(model = %model, "trying model");
        match attempt(model.clone()).await {
            Ok(answer) => {
                info!(model = %model, "model accepted");
                return Ok(answer);
            }
            Err(err) if err.is_invalid_model() => {
                warn!(model = %model, error = %err, "model rejected, trying next");
                last_reason = Some(err.reason());
            }
            Err(err) => return Err(err),
        }
    }

    Err(BackendError::AllModelsFailed {
        last_reason: last_reason.unwrap_or_else(|| "no models configured".to_string()),
    })
}
