//! Environment-backed access token provider

use async_trait::async_trait;
use bridge_traits::auth::AccessTokenProvider;
use bridge_traits::error::{BridgeError, Result};

/// Default variable read by [`EnvTokenProvider::default`]
pub const DEFAULT_TOKEN_VAR: &str = "DRIVE_ACCESS_TOKEN";

/// Reads the bearer token from an environment variable on every call
///
/// The variable is re-read each time so an external refresher can rotate
/// the credential while a long transfer is running.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    variable: String,
}

impl EnvTokenProvider {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_VAR)
    }
}

#[async_trait]
impl AccessTokenProvider for EnvTokenProvider {
    async fn access_token(&self) -> Result<String> {
        match std::env::var(&self.variable) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(BridgeError::NotAvailable(format!(
                "Access token variable {} is not set",
                self.variable
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_variable() {
        std::env::set_var("BRIDGE_DESKTOP_TEST_TOKEN", " abc \n");
        let provider = EnvTokenProvider::new("BRIDGE_DESKTOP_TEST_TOKEN");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_missing_variable_is_not_available() {
        let provider = EnvTokenProvider::new("BRIDGE_DESKTOP_TEST_TOKEN_MISSING");
        assert!(matches!(
            provider.access_token().await,
            Err(BridgeError::NotAvailable(_))
        ));
    }
}
