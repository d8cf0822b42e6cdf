//! The developer-mode authentication engine.
//!
//! One engine instance owns the session state. Every successful credential
//! check funnels into a single authenticate transition and every revocation
//! into a single lock transition; each transition publishes a
//! [`SessionSnapshot`] to subscribers and emits an event on the log sink.

use crate::allowlist::{normalize_token, TokenAllowList};
use crate::biometric::{BiometricAdapter, BiometricKind, UnavailableBiometrics};
use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, Result, StoreError};
use crate::hasher::{digests_match, hash_secret};
use crate::log::{LogLevel, LogSink, TracingSink, LOG_CATEGORY};
use crate::session::{AuthSession, SessionSnapshot};
use crate::store::{CredentialStore, DeleteOutcome, KeyValueStore, Protection};
use chrono::{DateTime, Utc};
use feather_core::AuthConfig;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Shown when verifying before any passcode was set.
pub const MSG_NO_PASSCODE: &str = "No passcode set";
/// Shown when the passcode digest does not match.
pub const MSG_INVALID_PASSCODE: &str = "Invalid passcode";
/// Shown when the device reports no biometric hardware.
pub const MSG_BIOMETRICS_UNAVAILABLE: &str = "Biometrics not available";
/// Shown when the biometric adapter fails without a reason.
pub const MSG_AUTHENTICATION_FAILED: &str = "Authentication failed";
/// Returned while another biometric challenge is outstanding.
pub const MSG_BIOMETRIC_IN_PROGRESS: &str = "Biometric authentication already in progress";
/// Shown when a developer token is not on the allow-list.
pub const MSG_INVALID_TOKEN: &str = "Invalid developer token";

/// Tunables for an [`AuthEngine`].
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// How long a session stays valid after authentication
    pub session_timeout: Duration,
    /// Minimum passcode length in characters
    pub min_passcode_length: usize,
    /// Credential store service for the passcode hash
    pub keychain_service: String,
    /// Credential store account for the passcode hash
    pub keychain_account: String,
    /// Preference key for the cached developer token
    pub token_cache_key: String,
    /// Prompt passed to the biometric challenge
    pub biometric_reason: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for AuthSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            session_timeout: Duration::from_secs(config.session_timeout_secs),
            min_passcode_length: config.min_passcode_length,
            keychain_service: config.keychain_service.clone(),
            keychain_account: config.keychain_account.clone(),
            token_cache_key: config.token_cache_key.clone(),
            biometric_reason: config.biometric_reason.clone(),
        }
    }
}

/// Which credential opened the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Stored passcode
    Passcode,
    /// Platform biometric challenge
    Biometric,
    /// Developer token on the allow-list
    DeveloperToken,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passcode => "passcode",
            Self::Biometric => "biometrics",
            Self::DeveloperToken => "developer token",
        })
    }
}

/// Outcome of [`AuthEngine::authenticate_with_biometrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiometricOutcome {
    /// Whether developer mode is now open
    pub success: bool,
    /// User-facing reason on failure
    pub error: Option<String>,
}

impl BiometricOutcome {
    fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }

    /// Split into the `(success, error)` pair.
    #[must_use]
    pub fn into_parts(self) -> (bool, Option<String>) {
        (self.success, self.error)
    }
}

/// Gate for the privileged developer mode.
///
/// Construct with [`AuthEngine::builder`] and share behind an `Arc`.
pub struct AuthEngine {
    settings: AuthSettings,
    credentials: Arc<dyn CredentialStore>,
    preferences: Arc<dyn KeyValueStore>,
    biometrics: Arc<dyn BiometricAdapter>,
    sink: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
    allow_list: TokenAllowList,
    session: RwLock<AuthSession>,
    /// Serializes credential operations from store access through the transition.
    credential_ops: Mutex<()>,
    notifier: watch::Sender<SessionSnapshot>,
    biometric_in_flight: AtomicBool,
}

impl AuthEngine {
    /// Start building an engine over the given stores.
    pub fn builder(
        credentials: Arc<dyn CredentialStore>,
        preferences: Arc<dyn KeyValueStore>,
    ) -> AuthEngineBuilder {
        AuthEngineBuilder {
            settings: AuthSettings::default(),
            credentials,
            preferences,
            biometrics: Arc::new(UnavailableBiometrics),
            sink: Arc::new(TracingSink),
            clock: Arc::new(SystemClock),
            allow_list: TokenAllowList::builtin(),
        }
    }

    /// Builder preloaded with settings and allow-list from `[auth]`.
    pub fn builder_from_config(
        config: &AuthConfig,
        credentials: Arc<dyn CredentialStore>,
        preferences: Arc<dyn KeyValueStore>,
    ) -> AuthEngineBuilder {
        Self::builder(credentials, preferences)
            .settings(AuthSettings::from(config))
            .allow_list(TokenAllowList::from_config(config))
    }

    // ── Queries ──────────────────────────────────────────

    /// Copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.read_session().snapshot()
    }

    /// Whether developer mode is open. Does not re-check expiry.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read_session().is_authenticated()
    }

    /// When the session was last opened.
    #[must_use]
    pub fn last_auth_time(&self) -> Option<DateTime<Utc>> {
        self.read_session().last_auth_time()
    }

    /// Last user-facing failure reason.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.read_session().last_error().map(str::to_string)
    }

    /// Configured session timeout.
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        self.settings.session_timeout
    }

    /// Time left before the session expires, `None` when locked.
    #[must_use]
    pub fn session_remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.read_session()
            .remaining(now, self.settings.session_timeout)
    }

    /// Observe every session transition.
    ///
    /// The receiver starts at the current snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.notifier.subscribe()
    }

    // ── Passcode ─────────────────────────────────────────

    /// Whether a passcode hash is stored.
    #[must_use]
    pub fn has_passcode_set(&self) -> bool {
        matches!(
            self.credentials
                .get(&self.settings.keychain_service, &self.settings.keychain_account),
            Ok(Some(_))
        )
    }

    /// Hash and store a new passcode, replacing any existing one.
    ///
    /// Leaves the session open/closed state untouched; failures are also
    /// reported through `last_error`.
    ///
    /// # Errors
    /// - [`AuthError::PasscodeTooShort`] below the minimum length; nothing is written.
    /// - [`AuthError::Store`] when the credential store rejects the write.
    pub fn set_passcode(&self, candidate: &str) -> Result<()> {
        let min = self.settings.min_passcode_length;
        if candidate.chars().count() < min {
            let err = AuthError::PasscodeTooShort { min };
            self.reject(LogLevel::Warning, &err.to_string());
            return Err(err);
        }

        let _credentials = self.lock_credentials();
        let digest = Zeroizing::new(hash_secret(candidate.as_bytes()));
        if let Err(e) = self.credentials.put(
            &self.settings.keychain_service,
            &self.settings.keychain_account,
            digest.as_bytes(),
            Protection::WhenUnlockedThisDeviceOnly,
        ) {
            self.reject(LogLevel::Error, &format!("Failed to save passcode: {e}"));
            return Err(e.into());
        }

        self.sink
            .log(LogLevel::Success, "Developer passcode set", LOG_CATEGORY);
        Ok(())
    }

    /// Check `candidate` against the stored passcode and open the session on a match.
    ///
    /// Fails closed when no passcode is stored or the store cannot be read.
    pub fn verify_passcode(&self, candidate: &str) -> bool {
        self.try_verify_passcode(candidate).is_ok()
    }

    /// [`Self::verify_passcode`] with the failure class.
    ///
    /// # Errors
    /// - [`AuthError::NotConfigured`] when no passcode is stored.
    /// - [`AuthError::CredentialMismatch`] when the digest differs.
    /// - [`AuthError::Store`] when the credential store cannot be read.
    pub fn try_verify_passcode(&self, candidate: &str) -> Result<()> {
        // Held until the transition so a concurrent removal cannot slip in between.
        let _credentials = self.lock_credentials();

        let stored = match self
            .credentials
            .get(&self.settings.keychain_service, &self.settings.keychain_account)
        {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.reject(LogLevel::Warning, MSG_NO_PASSCODE);
                return Err(AuthError::NotConfigured);
            }
            Err(e) => {
                self.reject(LogLevel::Error, &format!("Failed to read passcode: {e}"));
                return Err(e.into());
            }
        };

        let Ok(stored) = String::from_utf8(stored).map(Zeroizing::new) else {
            self.reject(LogLevel::Error, "Stored passcode is unreadable");
            return Err(AuthError::Store(StoreError::Backend(
                "stored passcode is not valid UTF-8".to_string(),
            )));
        };

        let digest = Zeroizing::new(hash_secret(candidate.as_bytes()));
        if digests_match(&stored, &digest) {
            self.authenticate(AuthMethod::Passcode);
            Ok(())
        } else {
            self.reject(LogLevel::Warning, MSG_INVALID_PASSCODE);
            Err(AuthError::CredentialMismatch)
        }
    }

    /// Delete the stored passcode and lock.
    ///
    /// An already-absent passcode counts as removed. Returns `false` only
    /// when the store fails, in which case the session is left as is.
    pub fn remove_passcode(&self) -> bool {
        let _credentials = self.lock_credentials();
        match self
            .credentials
            .delete(&self.settings.keychain_service, &self.settings.keychain_account)
        {
            Ok(outcome) => {
                if outcome == DeleteOutcome::NotFound {
                    debug!("no passcode stored, nothing to delete");
                }
                self.sink
                    .log(LogLevel::Info, "Developer passcode removed", LOG_CATEGORY);
                self.lock_developer_mode();
                true
            }
            Err(e) => {
                self.reject(LogLevel::Error, &format!("Failed to remove passcode: {e}"));
                false
            }
        }
    }

    // ── Biometrics ───────────────────────────────────────

    /// Biometric hardware reported by the adapter.
    #[must_use]
    pub fn biometric_kind(&self) -> BiometricKind {
        self.biometrics.capability()
    }

    /// Whether a biometric challenge is outstanding.
    #[must_use]
    pub fn biometric_in_progress(&self) -> bool {
        self.biometric_in_flight.load(Ordering::Acquire)
    }

    /// Run one biometric challenge and open the session on success.
    ///
    /// Only one challenge may be outstanding; a concurrent call resolves
    /// immediately without touching the session. Dropping the returned
    /// future before it resolves leaves the session unchanged.
    pub async fn authenticate_with_biometrics(&self) -> BiometricOutcome {
        match self.try_authenticate_with_biometrics().await {
            Ok(()) => BiometricOutcome::succeeded(),
            Err(AuthError::BiometricDenied(reason)) => BiometricOutcome::failed(reason),
            Err(other) => BiometricOutcome::failed(other.to_string()),
        }
    }

    /// [`Self::authenticate_with_biometrics`] with the failure class.
    ///
    /// # Errors
    /// - [`AuthError::BiometricUnavailable`] when the device has no biometrics.
    /// - [`AuthError::BiometricInProgress`] while another challenge is outstanding.
    /// - [`AuthError::BiometricDenied`] with the user-facing reason otherwise.
    pub async fn try_authenticate_with_biometrics(&self) -> Result<()> {
        let kind = self.biometrics.capability();
        if !kind.is_available() {
            self.reject(LogLevel::Warning, MSG_BIOMETRICS_UNAVAILABLE);
            return Err(AuthError::BiometricUnavailable);
        }

        let Some(_guard) = ChallengeGuard::acquire(&self.biometric_in_flight) else {
            warn!("biometric challenge already outstanding");
            return Err(AuthError::BiometricInProgress);
        };

        debug!(%kind, "issuing biometric challenge");
        let result = self.biometrics.challenge(&self.settings.biometric_reason).await;

        if result.success {
            self.authenticate(AuthMethod::Biometric);
            Ok(())
        } else {
            let reason = result
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| MSG_AUTHENTICATION_FAILED.to_string());
            self.reject(LogLevel::Warning, &reason);
            Err(AuthError::BiometricDenied(reason))
        }
    }

    // ── Developer tokens ─────────────────────────────────

    /// Check a developer token and open the session on a match.
    ///
    /// The normalized token is cached for [`Self::authenticate_with_saved_token`].
    /// A failed cache write is logged; the session stays open.
    pub fn validate_developer_token(&self, token: &str) -> bool {
        self.try_validate_developer_token(token).is_ok()
    }

    /// [`Self::validate_developer_token`] with the failure class.
    ///
    /// # Errors
    /// Returns [`AuthError::CredentialMismatch`] when the token is not on the allow-list.
    pub fn try_validate_developer_token(&self, token: &str) -> Result<()> {
        let _credentials = self.lock_credentials();
        self.validate_token_locked(token)
    }

    /// Re-authenticate with the cached developer token, if any.
    ///
    /// No cached token, or an unreadable cache, means `false` with no side effects.
    pub fn authenticate_with_saved_token(&self) -> bool {
        let _credentials = self.lock_credentials();
        match self.preferences.get_string(&self.settings.token_cache_key) {
            Ok(Some(token)) => {
                let token = Zeroizing::new(token);
                self.validate_token_locked(&token).is_ok()
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "could not read cached developer token");
                false
            }
        }
    }

    /// Whether a developer token is cached.
    #[must_use]
    pub fn has_saved_token(&self) -> bool {
        matches!(
            self.preferences.get_string(&self.settings.token_cache_key),
            Ok(Some(_))
        )
    }

    /// Forget the cached developer token. The session is not affected.
    pub fn clear_saved_token(&self) -> bool {
        let _credentials = self.lock_credentials();
        match self.preferences.remove(&self.settings.token_cache_key) {
            Ok(()) => {
                self.sink
                    .log(LogLevel::Info, "Saved developer token cleared", LOG_CATEGORY);
                true
            }
            Err(e) => {
                self.sink.log(
                    LogLevel::Error,
                    &format!("Failed to clear developer token: {e}"),
                    LOG_CATEGORY,
                );
                false
            }
        }
    }

    /// Caller must hold the credential lock.
    fn validate_token_locked(&self, token: &str) -> Result<()> {
        let normalized = Zeroizing::new(normalize_token(token));
        if !self.allow_list.contains(&normalized) {
            self.reject(LogLevel::Warning, MSG_INVALID_TOKEN);
            return Err(AuthError::CredentialMismatch);
        }

        self.authenticate(AuthMethod::DeveloperToken);

        if let Err(e) = self
            .preferences
            .set_string(&self.settings.token_cache_key, &normalized)
        {
            self.sink.log(
                LogLevel::Warning,
                &format!("Could not cache developer token: {e}"),
                LOG_CATEGORY,
            );
        }
        Ok(())
    }

    // ── Session lifecycle ────────────────────────────────

    /// Lock if the session has outlived the timeout.
    ///
    /// Call on foreground resume and before every privileged action.
    pub fn check_session_validity(&self) {
        let now = self.clock.now();
        let mut session = self.write_session();

        let should_lock = match session.last_auth_time() {
            None => session.is_authenticated(),
            Some(_) => session.is_expired(now, self.settings.session_timeout),
        };
        if !should_lock {
            return;
        }

        session.clear();
        self.publish(&session);
        drop(session);

        self.sink.log(
            LogLevel::Info,
            "Developer mode session expired",
            LOG_CATEGORY,
        );
    }

    /// Close developer mode unconditionally.
    pub fn lock_developer_mode(&self) {
        let mut session = self.write_session();
        session.clear();
        self.publish(&session);
        drop(session);

        self.sink
            .log(LogLevel::Info, "Developer mode locked", LOG_CATEGORY);
    }

    /// Gate for privileged actions: re-checks expiry, then requires an open session.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] when developer mode is locked.
    pub fn require_authenticated(&self) -> Result<()> {
        self.check_session_validity();
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AuthError::NotAuthenticated)
        }
    }

    // ── Transitions ──────────────────────────────────────

    fn authenticate(&self, method: AuthMethod) {
        let now = self.clock.now();
        let mut session = self.write_session();
        session.mark_authenticated(now);
        self.publish(&session);
        drop(session);

        self.sink.log(
            LogLevel::Success,
            &format!("Developer mode unlocked with {method}"),
            LOG_CATEGORY,
        );
    }

    fn reject(&self, level: LogLevel, message: &str) {
        let mut session = self.write_session();
        session.record_error(message);
        self.publish(&session);
        drop(session);

        self.sink.log(level, message, LOG_CATEGORY);
    }

    /// Publish while the write lock is held so observers see transitions in order.
    fn publish(&self, session: &AuthSession) {
        let snapshot = session.snapshot();
        self.notifier.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn lock_credentials(&self) -> MutexGuard<'_, ()> {
        self.credential_ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read_session(&self) -> RwLockReadGuard<'_, AuthSession> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, AuthSession> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AuthEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEngine")
            .field("settings", &self.settings)
            .field("session", &*self.read_session())
            .field("allow_list", &self.allow_list)
            .field("biometric_in_flight", &self.biometric_in_progress())
            .finish_non_exhaustive()
    }
}

/// Builder for [`AuthEngine`].
pub struct AuthEngineBuilder {
    settings: AuthSettings,
    credentials: Arc<dyn CredentialStore>,
    preferences: Arc<dyn KeyValueStore>,
    biometrics: Arc<dyn BiometricAdapter>,
    sink: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
    allow_list: TokenAllowList,
}

impl AuthEngineBuilder {
    /// Replace the settings.
    #[must_use]
    pub fn settings(mut self, settings: AuthSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use a platform biometric adapter.
    #[must_use]
    pub fn biometrics(mut self, biometrics: Arc<dyn BiometricAdapter>) -> Self {
        self.biometrics = biometrics;
        self
    }

    /// Send events to `sink` instead of `tracing`.
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use a custom time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Accept a different set of developer tokens.
    #[must_use]
    pub fn allow_list(mut self, allow_list: TokenAllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// Build a locked engine.
    #[must_use]
    pub fn build(self) -> AuthEngine {
        let session = AuthSession::new();
        let (notifier, _) = watch::channel(session.snapshot());
        AuthEngine {
            settings: self.settings,
            credentials: self.credentials,
            preferences: self.preferences,
            biometrics: self.biometrics,
            sink: self.sink,
            clock: self.clock,
            allow_list: self.allow_list,
            session: RwLock::new(session),
            credential_ops: Mutex::new(()),
            notifier,
            biometric_in_flight: AtomicBool::new(false),
        }
    }
}

impl fmt::Debug for AuthEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEngineBuilder")
            .field("settings", &self.settings)
            .field("allow_list", &self.allow_list)
            .finish_non_exhaustive()
    }
}

/// Marks a biometric challenge as outstanding until dropped.
struct ChallengeGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ChallengeGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ChallengeGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
