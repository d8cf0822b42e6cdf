//! Feather Core - Foundation crate for the Feather developer tooling.
//!
//! Shared error types, configuration and logging setup that the other
//! Feather crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`Timestamp`)
//! - [`logging`] - Tracing subscriber initialisation
//!
//! # Example
//!
//! ```rust
//! use feather_core::AppConfig;
//!
//! let config = AppConfig::default();
//! assert_eq!(config.auth.session_timeout_secs, 300);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, AuthConfig, LoggingConfig, DEFAULT_DEVELOPER_TOKENS};
pub use error::{ConfigError, ConfigResult, FeatherError, Result};
pub use types::Timestamp;
