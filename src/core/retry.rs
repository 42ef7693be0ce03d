//! Bounded retry around a fallible async call.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::notice::{Notice, Notifier};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

#[derive(Debug)]
pub enum RetryError<E> {
    Exhausted { attempts: u32, last: E },
    /// Cancelled before, during or between attempts.
    Cancelled { attempts: u32, last: Option<E> },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Cancelled { last, .. } => last.as_ref(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { last, .. } => write!(f, "{last}"),
            RetryError::Cancelled { .. } => write!(f, "cancelled"),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.last_error().map(|err| err as &(dyn Error + 'static))
    }
}

/// Runs `call` until it succeeds or the policy's retries are used up.
///
/// Before each retry a notice `"<label>... (<remaining>)"` is emitted and
/// the task sleeps for `policy.delay`. Both the attempt in flight and the
/// sleep end early when `cancel` fires.
pub async fn retry_call<T, E, F, Fut>(
    policy: &RetryPolicy,
    notifier: &dyn Notifier,
    label: &str,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut remaining = policy.max_retries;
    let mut attempts = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled {
                attempts,
                last: None,
            });
        }
        attempts += 1;
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(RetryError::Cancelled {
                    attempts,
                    last: None,
                });
            }
            outcome = call() => outcome,
        };
        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if remaining == 0 {
            return Err(RetryError::Exhausted {
                attempts,
                last: err,
            });
        }

        warn!(attempt = attempts, remaining, error = %err, "call failed, retrying");
        notifier.notify(Notice::error(format!("{label}... ({remaining})")));

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(RetryError::Cancelled {
                    attempts,
                    last: Some(err),
                });
            }
            _ = tokio::time::sleep(policy.delay) => {}
        }
        remaining -= 1;
    }
}
