//! In-memory audit trail of authentication events.

use crate::log::{LogLevel, LogSink};
use feather_core::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// Entries kept before the oldest are dropped.
pub const DEFAULT_AUDIT_CAPACITY: usize = 512;

/// Records authentication events for later review.
///
/// Bounded: once full, the oldest entry is evicted for each new one.
#[derive(Debug)]
pub struct AuditLog {
    entries: RwLock<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    /// Create an audit log with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    /// Create an audit log holding at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_AUDIT_CAPACITY))),
            capacity: capacity.max(1),
        }
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.read().iter().cloned().collect()
    }

    /// The last `count` entries, oldest first.
    #[must_use]
    pub fn recent_entries(&self, count: usize) -> Vec<AuditEntry> {
        let entries = self.read();
        let start = entries.len().saturating_sub(count);
        entries.iter().skip(start).cloned().collect()
    }

    /// Entries recorded under `category`.
    #[must_use]
    pub fn entries_in_category(&self, category: &str) -> Vec<AuditEntry> {
        self.read()
            .iter()
            .filter(|entry| entry.category == category)
            .cloned()
            .collect()
    }

    /// Entries recorded at `level`.
    #[must_use]
    pub fn entries_at_level(&self, level: LogLevel) -> Vec<AuditEntry> {
        self.read()
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }

    /// Clear all audit entries.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Get count of entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, VecDeque<AuditEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for AuditLog {
    fn log(&self, level: LogLevel, message: &str, category: &str) {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            timestamp: Timestamp::now(),
            level,
            category: category.to_string(),
            message: message.to_string(),
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// When this event occurred
    pub timestamp: Timestamp,

    /// Severity
    pub level: LogLevel,

    /// Subsystem that produced the event
    pub category: String,

    /// Human-readable message (never contains secrets)
    pub message: String,
}

impl AuditEntry {
    /// One-line rendering for diagnostics screens.
    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "[{}] {} {}: {}",
            self.timestamp, self.level, self.category, self.message
        )
    }
}
