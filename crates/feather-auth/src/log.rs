//! Authentication event sinks.
//!
//! Sinks are fire-and-forget: they never block for long and never report
//! failure back to the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Category attached to every developer-mode event.
pub const LOG_CATEGORY: &str = "DeveloperMode";

/// Severity of an authentication event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Routine state change
    Info,
    /// Successful authentication or credential update
    Success,
    /// Rejected attempt
    Warning,
    /// Storage or platform failure
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Receiver for authentication outcomes.
pub trait LogSink: Send + Sync {
    /// Record one event. Must not panic or block.
    fn log(&self, level: LogLevel, message: &str, category: &str);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str, category: &str) {
        match level {
            LogLevel::Info => info!(category, "{message}"),
            LogLevel::Success => info!(category, outcome = "success", "{message}"),
            LogLevel::Warning => warn!(category, "{message}"),
            LogLevel::Error => error!(category, "{message}"),
        }
    }
}

/// Delivers each event to several sinks in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutSink {
    /// Empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a downstream sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl LogSink for FanoutSink {
    fn log(&self, level: LogLevel, message: &str, category: &str) {
        for sink in &self.sinks {
            sink.log(level, message, category);
        }
    }
}
