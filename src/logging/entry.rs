use super::Severity;
use std::fmt::{self, Display, Formatter};

/// One structured diagnostic record: severity, category, source, and
/// message, stamped with both mission GET and a wall-clock timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    pub get_seconds: f64,
    pub wall_clock: chrono::DateTime<chrono::Utc>,
    pub severity: Severity,
    pub category: String,
    pub source: String,
    pub message: String,
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let get = crate::time::format_get(self.get_seconds);
        write!(
            f,
            "{}[{}]\x1b[0m {} [{}/{}] {}",
            self.severity.ansi_prefix(),
            get,
            self.wall_clock.format("%H:%M:%S"),
            self.category,
            self.source,
            self.message,
        )
    }
}
