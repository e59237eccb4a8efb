//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the mirror core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other core crates depend on.
//! It establishes the logging conventions and the fail-fast dependency
//! validation used throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
