//! Authenticated Session Abstraction
//!
//! The core never manages token lifecycle. Hosts hand in a provider that
//! returns a fresh or cached bearer token whenever a remote call is built.

use async_trait::async_trait;

use crate::error::Result;

/// Source of OAuth access tokens
///
/// # Security
///
/// Implementations must never log the returned token.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Return a token valid for at least the next request
    async fn access_token(&self) -> Result<String>;
}

/// Provider that always hands out the same token
///
/// Useful for short-lived tools and tests where the host already refreshed
/// the credential.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
