//! Admission limiter backed by a semaphore and a minimum call interval

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    limiter::{AdmissionLimiter, AdmissionPermit},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Process-wide limiter for remote API calls
///
/// Bounds the number of calls in flight and enforces a minimum delay between
/// consecutive admissions. Share one instance (behind an `Arc`) across every
/// component that talks to the same API.
pub struct PacedLimiter {
    in_flight: Arc<Semaphore>,
    min_interval: Duration,
    last_admission: Mutex<Option<Instant>>,
}

impl PacedLimiter {
    /// Create a limiter
    ///
    /// # Arguments
    ///
    /// * `max_in_flight` - Upper bound on concurrently admitted calls (at least 1)
    /// * `min_interval` - Minimum spacing between two admissions
    pub fn new(max_in_flight: usize, min_interval: Duration) -> Self {
        Self {
            in_flight: Arc::new(Semaphore::new(max_in_flight.max(1))),
            min_interval,
            last_admission: Mutex::new(None),
        }
    }

    /// Number of calls that could be admitted right now without waiting on
    /// the in-flight bound
    pub fn available_slots(&self) -> usize {
        self.in_flight.available_permits()
    }
}

#[async_trait]
impl AdmissionLimiter for PacedLimiter {
    async fn admit(&self) -> Result<AdmissionPermit> {
        let slot = Arc::clone(&self.in_flight)
            .acquire_owned()
            .await
            .map_err(|_| BridgeError::NotAvailable("Admission limiter closed".to_string()))?;

        let mut last = self.last_admission.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }
        *last = Some(Instant::now());

        Ok(AdmissionPermit::holding(slot))
    }
}
