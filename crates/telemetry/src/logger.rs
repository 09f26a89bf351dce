//! Injectable diagnostic sink.

use std::sync::Mutex;

/// Severity levels understood by every [`Logger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Diagnostic sink handed to components at construction.
///
/// Every entry names the resource and the operation that produced it, so a
/// log line can be traced back to its call site without runtime reflection.
pub trait Logger: Send + Sync {
    fn log(&self, severity: Severity, resource: &str, operation: &str, message: &str);

    fn debug(&self, resource: &str, operation: &str, message: &str) {
        self.log(Severity::Debug, resource, operation, message);
    }

    fn info(&self, resource: &str, operation: &str, message: &str) {
        self.log(Severity::Info, resource, operation, message);
    }

    fn warn(&self, resource: &str, operation: &str, message: &str) {
        self.log(Severity::Warning, resource, operation, message);
    }

    fn error(&self, resource: &str, operation: &str, message: &str) {
        self.log(Severity::Error, resource, operation, message);
    }
}

/// Forwards entries to the installed `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub const fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, severity: Severity, resource: &str, operation: &str, message: &str) {
        match severity {
            Severity::Debug => {
                tracing::debug!(target: "bookstore::resource", resource, operation, "{message}")
            }
            Severity::Info => {
                tracing::info!(target: "bookstore::resource", resource, operation, "{message}")
            }
            Severity::Warning => {
                tracing::warn!(target: "bookstore::resource", resource, operation, "{message}")
            }
            Severity::Error => {
                tracing::error!(target: "bookstore::resource", resource, operation, "{message}")
            }
        }
    }
}

/// A captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,
    pub resource: String,
    pub operation: String,
    pub message: String,
}

/// Keeps entries in memory; used by tests to assert on what was logged.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Entries at `severity` or above
    pub fn at_least(&self, severity: Severity) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.severity >= severity)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, severity: Severity, resource: &str, operation: &str, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                severity,
                resource: resource.to_string(),
                operation: operation.to_string(),
                message: message.to_string(),
            });
        }
    }
}
