//! Developer token allow-list.
//!
//! Tokens are compared after normalization: surrounding whitespace is
//! trimmed and the token is upper-cased. Mixed-case input is therefore
//! indistinguishable from the canonical token.

use feather_core::{AuthConfig, DEFAULT_DEVELOPER_TOKENS};
use std::collections::HashSet;
use std::fmt;

/// Canonical form used for comparison and caching.
#[must_use]
pub fn normalize_token(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Fixed set of accepted developer tokens.
///
/// Immutable once built. `Debug` prints only the size.
#[derive(Clone)]
pub struct TokenAllowList {
    tokens: HashSet<String>,
}

impl TokenAllowList {
    /// Build from any token source. Entries are normalized; blank ones are skipped.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| normalize_token(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// The tokens compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(DEFAULT_DEVELOPER_TOKENS.iter().copied())
    }

    /// Tokens from `[auth].developer_tokens`.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.developer_tokens)
    }

    /// Whether an already-normalized token is accepted.
    #[must_use]
    pub fn contains(&self, normalized: &str) -> bool {
        self.tokens.contains(normalized)
    }

    /// Number of accepted tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no token is accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for TokenAllowList {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for TokenAllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAllowList")
            .field("len", &self.tokens.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(
            normalize_token("  feather-dev-2024-alpha \n"),
            "FEATHER-DEV-2024-ALPHA"
        );
        assert_eq!(normalize_token("   "), "");
    }

    #[test]
    fn test_builtin_contains_defaults() {
        let list = TokenAllowList::builtin();
        assert_eq!(list.len(), DEFAULT_DEVELOPER_TOKENS.len());
        assert!(list.contains("FEATHER-DEV-2024-ALPHA"));
        assert!(!list.contains("feather-dev-2024-alpha"));
        assert!(!list.contains("NOT-A-REAL-TOKEN"));
    }

    #[test]
    fn test_custom_source_is_normalized() {
        let list = TokenAllowList::new(["  team-token ", "", "TEAM-TOKEN"]);
        assert_eq!(list.len(), 1);
        assert!(list.contains("TEAM-TOKEN"));
    }

    #[test]
    fn test_from_config() {
        let config = AuthConfig {
            developer_tokens: vec!["ci-only".to_string()],
            ..AuthConfig::default()
        };
        let list = TokenAllowList::from_config(&config);
        assert!(list.contains("CI-ONLY"));
        assert!(!list.contains("FEATHER-DEV-2024-ALPHA"));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let rendered = format!("{:?}", TokenAllowList::builtin());
        assert!(!rendered.contains("FEATHER"));
    }
}
