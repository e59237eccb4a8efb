//! # Retry Policy
//!
//! Bounded re-invocation of single remote calls.
//!
//! Every attempt first passes through the shared [`AdmissionLimiter`]; there
//! is no backoff of our own, so the limiter alone paces re-attempts.
//! Classification of the last failure:
//!
//! - "does not exist" surfaces immediately as [`SyncError::NotFound`]
//! - malformed responses and missing capabilities surface as
//!   [`SyncError::Fatal`] without another attempt
//! - anything else is retried until the budget is spent, then surfaces as
//!   [`SyncError::Transient`]

use bridge_traits::error::BridgeError;
use bridge_traits::limiter::{AdmissionLimiter, Unthrottled};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};

/// Attempts per remote call, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry wrapper shared by every remote call of a mirror operation
#[derive(Clone)]
pub struct RetryPolicy {
    limiter: Arc<dyn AdmissionLimiter>,
    max_attempts: u32,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Arc::new(Unthrottled), DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// `max_attempts` below one is treated as one
    pub fn new(limiter: Arc<dyn AdmissionLimiter>, max_attempts: u32) -> Self {
        Self {
            limiter,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `call` until it succeeds, fails permanently or runs out of attempts
    ///
    /// `resource` names what the call addresses; it ends up in log lines and
    /// in the `path` of a `NotFound` error.
    pub async fn run<T, F, Fut>(&self, resource: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, BridgeError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let permit = self
                .limiter
                .admit()
                .await
                .map_err(|e| SyncError::fatal("Admission refused", e))?;
            let outcome = call().await;
            drop(permit);

            let error = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(resource, attempt, "Remote call recovered");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if error.is_not_found() {
                return Err(SyncError::not_found(resource, error.to_string()));
            }

            if !error.is_retryable() {
                return Err(SyncError::fatal(resource, error));
            }

            if attempt >= self.max_attempts {
                warn!(
                    resource,
                    attempts = attempt,
                    error = %error,
                    "Remote call failed, giving up"
                );
                return Err(SyncError::Transient {
                    attempts: attempt,
                    message: format!("{}: {}", resource, error),
                });
            }

            warn!(
                resource,
                attempt,
                max_attempts = self.max_attempts,
                error = %error,
                "Remote call failed, retrying"
            );
        }
    }
}
