//! Failure notification sinks
//!
//! Convenience operations report failures through a single [`NotificationSink`]
//! picked when the [`WebApi`](super::operations::WebApi) is built.

use colored::Colorize;
use is_terminal::IsTerminal;
use std::sync::Arc;

/// Default text placed before every failure message
pub const DEFAULT_NOTIFICATION_PREFIX: &str = "Process execution failed: ";

/// Somewhere to surface operation failures to a user
pub trait NotificationSink: Send + Sync {
    fn show(&self, message: &str);
    fn clear(&self);
}

/// Writes notifications to stderr in colour
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    prefix: String,
}

impl ConsoleSink {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl NotificationSink for ConsoleSink {
    fn show(&self, message: &str) {
        eprintln!("{} {}{}", "✗".red().bold(), self.prefix, message.red());
    }

    fn clear(&self) {}
}

/// Routes notifications through the `log` facade
#[derive(Debug, Clone)]
pub struct LogSink {
    prefix: String,
}

impl LogSink {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl NotificationSink for LogSink {
    fn show(&self, message: &str) {
        log::error!("{}{}", self.prefix, message);
    }

    fn clear(&self) {
        log::debug!("Notification cleared");
    }
}

/// Drops every notification
#[derive(Debug, Clone, Default)]
pub struct SilentSink;

impl NotificationSink for SilentSink {
    fn show(&self, _message: &str) {}

    fn clear(&self) {}
}

/// Pick a sink for the current process: the console when stderr is a terminal, the log otherwise
pub fn select_sink(prefix: &str) -> Arc<dyn NotificationSink> {
    if std::io::stderr().is_terminal() {
        Arc::new(ConsoleSink::new(prefix))
    } else {
        Arc::new(LogSink::new(prefix))
    }
}
