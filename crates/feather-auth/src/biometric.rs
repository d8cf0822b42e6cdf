//! Platform biometric boundary.
//!
//! The engine treats the platform verifier as an opaque async challenge:
//! ask what hardware exists, then issue one challenge and await the answer.
//!
//! ```text
//! BiometricAdapter (trait)
//! ├── UnavailableBiometrics  (always BiometricKind::None)
//! └── ScriptedBiometrics     (queued answers, optional gate)
//! ```
//!
//! Host applications implement [`BiometricAdapter`] over Touch ID, Face ID,
//! Windows Hello or fprintd.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

/// Biometric hardware reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricKind {
    /// No usable biometric hardware or no enrollment
    None,
    /// Fingerprint reader
    Touch,
    /// Face recognition
    Face,
    /// Some other platform verifier
    Other,
}

impl BiometricKind {
    /// Whether a challenge can be issued.
    #[must_use]
    pub fn is_available(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Human-readable name for prompts and settings screens.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Touch => "Touch ID",
            Self::Face => "Face ID",
            Self::Other => "Biometrics",
        }
    }
}

impl fmt::Display for BiometricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Answer to a single biometric challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResult {
    /// Whether the device owner was verified
    pub success: bool,
    /// Platform-supplied reason on failure
    pub error: Option<String>,
}

impl ChallengeResult {
    /// A verified challenge.
    #[must_use]
    pub fn verified() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A rejected or cancelled challenge.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

/// Platform biometric verifier.
#[async_trait]
pub trait BiometricAdapter: Send + Sync {
    /// What the device can do right now.
    fn capability(&self) -> BiometricKind;

    /// Show the platform prompt with `reason` and wait for the outcome.
    async fn challenge(&self, reason: &str) -> ChallengeResult;
}

/// Adapter for devices without biometrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBiometrics;

#[async_trait]
impl BiometricAdapter for UnavailableBiometrics {
    fn capability(&self) -> BiometricKind {
        BiometricKind::None
    }

    async fn challenge(&self, _reason: &str) -> ChallengeResult {
        ChallengeResult::rejected("Biometrics not available")
    }
}

/// Adapter that replays queued answers.
///
/// With a gate, each challenge waits for one permit before answering, which
/// lets callers hold a challenge open. An empty queue answers as a user
/// cancellation.
#[derive(Debug)]
pub struct ScriptedBiometrics {
    kind: BiometricKind,
    responses: Mutex<VecDeque<ChallengeResult>>,
    reasons: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedBiometrics {
    /// Scripted adapter reporting `kind`.
    #[must_use]
    pub fn new(kind: BiometricKind) -> Self {
        Self {
            kind,
            responses: Mutex::new(VecDeque::new()),
            reasons: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Hold every challenge until the returned semaphore gets a permit.
    #[must_use]
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Queue the answer for the next challenge.
    #[must_use]
    pub fn with_response(self, response: ChallengeResult) -> Self {
        self.push_response(response);
        self
    }

    /// Queue the answer for a later challenge.
    pub fn push_response(&self, response: ChallengeResult) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Reasons passed to every challenge issued so far.
    #[must_use]
    pub fn reasons(&self) -> Vec<String> {
        self.reasons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of challenges issued.
    #[must_use]
    pub fn challenge_count(&self) -> usize {
        self.reasons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl BiometricAdapter for ScriptedBiometrics {
    fn capability(&self) -> BiometricKind {
        self.kind
    }

    async fn challenge(&self, reason: &str) -> ChallengeResult {
        self.reasons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reason.to_string());

        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return ChallengeResult::rejected("Biometric prompt invalidated"),
            }
        }

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| ChallengeResult::rejected("User cancelled"))
    }
}
