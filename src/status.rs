//! Status notifications.
//!
//! The sync core reports progress and recovered errors as
//! `(message, is_error)` pairs. What happens to them is up to the sink.

use std::sync::Mutex;

use colored::Colorize;
use tracing::{error, info};

/// Receiver for human-readable status messages.
pub trait StatusSink: Send + Sync {
    /// Accept one message. Must not fail.
    fn notify(&self, message: &str, is_error: bool);
}

/// Forwards messages to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn notify(&self, message: &str, is_error: bool) {
        if is_error {
            error!(target: "qsync::status", "{message}");
        } else {
            info!(target: "qsync::status", "{message}");
        }
    }
}

/// Prints messages to stderr for interactive use.
///
/// Errors are always printed; progress messages only when not quiet.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink {
    quiet: bool,
}

impl ConsoleSink {
    /// Create a console sink.
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl StatusSink for ConsoleSink {
    fn notify(&self, message: &str, is_error: bool) {
        if is_error {
            eprintln!("{} {message}", "error:".red().bold());
        } else if !self.quiet {
            eprintln!("{} {message}", "::".cyan());
        }
    }
}

/// Collects messages in memory. Used by tests and embedders that want to
/// render notifications themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<(String, bool)>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<(String, bool)> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Only the messages flagged as errors.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|(message, is_error)| is_error.then_some(message))
            .collect()
    }

    /// True if any received message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|(m, _)| m.contains(needle))
    }
}

impl StatusSink for MemorySink {
    fn notify(&self, message: &str, is_error: bool) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((message.to_string(), is_error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_severity() {
        let sink = MemorySink::new();
        sink.notify("Saved 3 records", false);
        sink.notify("Fetch failed", true);

        assert_eq!(sink.messages().len(), 2);
        assert_eq!(sink.errors(), vec!["Fetch failed".to_string()]);
        assert!(sink.contains("Saved"));
    }
}
