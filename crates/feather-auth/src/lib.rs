//! Feather Developer-Mode Authentication
//!
//! Gates the privileged developer mode behind one of three credentials and
//! keeps the resulting session bounded in time.
//!
//! # Credentials
//!
//! 1. **Passcode**: stored only as a SHA-256 digest in a [`CredentialStore`]
//! 2. **Biometrics**: delegated to a platform [`BiometricAdapter`]
//! 3. **Developer token**: checked against a [`TokenAllowList`] and cached in a
//!    plain [`KeyValueStore`] for relaunch
//!
//! # Session Management
//!
//! - Starts locked on every launch; session state is never persisted
//! - Expires after the session timeout (default: 5 minutes), evaluated lazily
//!   by [`AuthEngine::check_session_validity`]
//! - Transitions are observable through [`AuthEngine::subscribe`]
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use feather_auth::{AuthEngine, MemoryCredentialStore, MemoryKeyValueStore};
//!
//! let engine = AuthEngine::builder(
//!     Arc::new(MemoryCredentialStore::new()),
//!     Arc::new(MemoryKeyValueStore::new()),
//! )
//! .build();
//!
//! engine.set_passcode("correct horse").expect("store passcode");
//! assert!(engine.verify_passcode("correct horse"));
//! engine.lock_developer_mode();
//! assert!(!engine.is_authenticated());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod allowlist;
pub mod audit;
pub mod biometric;
pub mod clock;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod log;
pub mod session;
pub mod store;

pub use allowlist::{normalize_token, TokenAllowList};
pub use audit::{AuditEntry, AuditLog};
pub use biometric::{
    BiometricAdapter, BiometricKind, ChallengeResult, ScriptedBiometrics, UnavailableBiometrics,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{AuthEngine, AuthEngineBuilder, AuthMethod, AuthSettings, BiometricOutcome};
pub use error::{AuthError, Result, StoreError, StoreResult};
pub use hasher::{digests_match, hash_secret};
pub use log::{FanoutSink, LogLevel, LogSink, TracingSink, LOG_CATEGORY};
pub use session::{AuthSession, SessionSnapshot, SessionState};
pub use store::{
    CredentialStore, DeleteOutcome, FileKeyValueStore, KeyValueStore, MemoryCredentialStore,
    MemoryKeyValueStore, Protection, PREFERENCES_FILE_NAME,
};
