//! Shared types used across Feather crates.

use crate::error::FeatherError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// UTC timestamp wrapper with RFC3339 formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse from an RFC3339 string.
    ///
    /// # Errors
    /// Returns error if the string is not valid RFC3339.
    pub fn from_rfc3339(s: &str) -> Result<Self, FeatherError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| FeatherError::Validation(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get seconds since Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }

    /// Underlying `chrono` value.
    #[must_use]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_rfc3339() {
        let ts = Timestamp::now();
        let s = ts.to_rfc3339();
        let parsed = Timestamp::from_rfc3339(&s).expect("parse RFC3339 timestamp");
        assert_eq!(ts.timestamp(), parsed.timestamp());
    }

    #[test]
    fn test_timestamp_invalid() {
        assert!(Timestamp::from_rfc3339("yesterday").is_err());
    }

    #[test]
    fn test_timestamp_serialization() {
        let ts = Timestamp::from_rfc3339("2024-03-01T12:00:00Z").expect("parse");
        let json = serde_json::to_string(&ts).expect("serialize timestamp");
        let back: Timestamp = serde_json::from_str(&json).expect("deserialize timestamp");
        assert_eq!(back, ts);
    }
}
