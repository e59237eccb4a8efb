//! Admission Limiter Abstraction
//!
//! A process-wide gate every remote call passes through. The limiter is
//! injected as a capability rather than held as global state, so tests can
//! substitute [`Unthrottled`].

use async_trait::async_trait;

use crate::error::Result;

/// Proof of admission; the slot is released when the permit is dropped.
pub struct AdmissionPermit {
    _guard: Option<Box<dyn Send + Sync>>,
}

impl AdmissionPermit {
    /// Permit that holds no resources
    pub fn unrestricted() -> Self {
        Self { _guard: None }
    }

    /// Permit that keeps `guard` alive until the call completes
    pub fn holding<G: Send + Sync + 'static>(guard: G) -> Self {
        Self {
            _guard: Some(Box::new(guard)),
        }
    }
}

impl std::fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionPermit")
            .field("restricted", &self._guard.is_some())
            .finish()
    }
}

/// Shared gate restricting concurrent and total calls to a remote API
///
/// # Example
///
/// ```ignore
/// async fn call(limiter: &dyn AdmissionLimiter, storage: &dyn RemoteStorage) -> Result<()> {
///     let _permit = limiter.admit().await?;
///     storage.delete_by_id("abc").await
/// }
/// ```
#[async_trait]
pub trait AdmissionLimiter: Send + Sync {
    /// Wait until the next call may be issued
    async fn admit(&self) -> Result<AdmissionPermit>;
}

/// Limiter that admits every call immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

#[async_trait]
impl AdmissionLimiter for Unthrottled {
    async fn admit(&self) -> Result<AdmissionPermit> {
        Ok(AdmissionPermit::unrestricted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_unthrottled_admits() {
        let permit = Unthrottled.admit().await.unwrap();
        assert_eq!(format!("{:?}", permit), "AdmissionPermit { restricted: false }");
    }

    #[test]
    fn test_permit_releases_guard_on_drop() {
        let released = Arc::new(AtomicBool::new(false));
        let permit = AdmissionPermit::holding(DropFlag(released.clone()));
        assert!(!released.load(Ordering::SeqCst));
        drop(permit);
        assert!(released.load(Ordering::SeqCst));
    }
}
