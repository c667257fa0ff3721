//! The Mission Logger: the single diagnostics sink every other component
//! writes through (see §4.1/§7 of the design spec).
//!
//! Every other subsystem is handed a `&mut MissionLogger` (or appends through
//! the kernel) instead of printing directly or silently swallowing a
//! recoverable condition. Entries are kept in a bounded ring buffer, like the
//! audio dispatcher's ledger, and mirrored to a colorized console line the
//! way this codebase's `info!`/`warn!`/`error!` macros already do, stamped
//! with a wall-clock timestamp for human operators (GET travels alongside
//! but is the authoritative mission time).

mod entry;
mod severity;

pub use entry::LogEntry;
pub use severity::Severity;

/// Default cap on the number of entries retained by [`MissionLogger`].
pub const DEFAULT_MAX_ENTRIES: usize = 4096;

/// An append-only, bounded log sink.
#[derive(Debug, Clone)]
pub struct MissionLogger {
    entries: std::collections::VecDeque<LogEntry>,
    max_entries: usize,
    echo_to_console: bool,
}

impl MissionLogger {
    /// Creates a logger with the default capacity, echoing to stdout.
    #[must_use]
    pub fn new() -> Self { Self::with_capacity(DEFAULT_MAX_ENTRIES) }

    /// Creates a logger with an explicit capacity.
    #[must_use]
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: std::collections::VecDeque::with_capacity(max_entries.min(1024)),
            max_entries: max_entries.max(1),
            echo_to_console: true,
        }
    }

    /// Disables the console mirror, used by tests that only want the ledger.
    pub fn set_echo_to_console(&mut self, echo: bool) { self.echo_to_console = echo; }

    /// Appends a structured entry, trimming the oldest entry on overflow.
    pub fn log(&mut self, get_seconds: f64, severity: Severity, category: &str, source: &str, message: impl Into<String>) {
        let entry = LogEntry {
            get_seconds,
            wall_clock: chrono::Utc::now(),
            severity,
            category: category.to_string(),
            source: source.to_string(),
            message: message.into(),
        };
        if self.echo_to_console {
            println!("{entry}");
        }
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Convenience wrapper for [`Severity::Info`].
    pub fn info(&mut self, get_seconds: f64, category: &str, source: &str, message: impl Into<String>) {
        self.log(get_seconds, Severity::Info, category, source, message);
    }

    /// Convenience wrapper for [`Severity::Log`].
    pub fn note(&mut self, get_seconds: f64, category: &str, source: &str, message: impl Into<String>) {
        self.log(get_seconds, Severity::Log, category, source, message);
    }

    /// Convenience wrapper for [`Severity::Warn`].
    pub fn warn(&mut self, get_seconds: f64, category: &str, source: &str, message: impl Into<String>) {
        self.log(get_seconds, Severity::Warn, category, source, message);
    }

    /// Convenience wrapper for [`Severity::Error`].
    pub fn error(&mut self, get_seconds: f64, category: &str, source: &str, message: impl Into<String>) {
        self.log(get_seconds, Severity::Error, category, source, message);
    }

    /// Convenience wrapper for [`Severity::Event`].
    pub fn event(&mut self, get_seconds: f64, category: &str, source: &str, message: impl Into<String>) {
        self.log(get_seconds, Severity::Event, category, source, message);
    }

    /// Returns every retained entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> &std::collections::VecDeque<LogEntry> { &self.entries }

    /// The number of entries currently retained.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// True when no entries are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Drains and returns every retained entry, leaving the ledger empty.
    /// Used by external exporters that want to flush the buffer.
    pub fn drain(&mut self) -> Vec<LogEntry> { self.entries.drain(..).collect() }
}

impl Default for MissionLogger {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::{MissionLogger, Severity};

    #[test]
    fn trims_oldest_entry_on_overflow() {
        let mut logger = MissionLogger::with_capacity(2);
        logger.set_echo_to_console(false);
        logger.info(0.0, "cat", "src", "first");
        logger.info(1.0, "cat", "src", "second");
        logger.info(2.0, "cat", "src", "third");
        assert_eq!(logger.len(), 2);
        assert_eq!(logger.entries()[0].message, "second");
        assert_eq!(logger.entries()[1].message, "third");
    }

    #[test]
    fn severity_is_retained() {
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        logger.warn(5.0, "resources", "resource_system", "tank low");
        assert_eq!(logger.entries()[0].severity, Severity::Warn);
    }
}
