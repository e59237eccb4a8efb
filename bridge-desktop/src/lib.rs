//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `FileSystemAccess` using `tokio::fs`
//! - `AdmissionLimiter` using a Tokio semaphore plus a minimum call interval
//! - `AccessTokenProvider` reading a bearer token from the environment
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{PacedLimiter, ReqwestHttpClient, TokioFileSystem};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let fs = TokioFileSystem::new();
//!     let limiter = PacedLimiter::new(8, Duration::from_millis(100));
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod auth;
mod filesystem;
mod http;
mod limiter;

pub use auth::{EnvTokenProvider, DEFAULT_TOKEN_VAR};
pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use limiter::PacedLimiter;
