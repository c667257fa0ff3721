/// The severity of a [`super::LogEntry`], mirroring this codebase's
/// `info!`/`log!`/`warn!`/`error!`/`event!` macro tiers as a first-class enum
/// so the logger can be queried and filtered instead of only printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Log,
    Warn,
    Error,
    /// Diagnostic/debug-only events, analogous to this codebase's `event!`
    /// macro which is gated behind an environment variable upstream; here
    /// it is just the lowest-priority tier, always retained in the ledger.
    Event,
}

impl Severity {
    /// The ANSI color-escape prefix used for the console mirror, matching
    /// the palette this codebase's logging macros use per severity.
    #[must_use]
    pub fn ansi_prefix(self) -> &'static str {
        match self {
            Severity::Info => "\x1b[32m[INFO] ",
            Severity::Log => "\x1b[33m[LOG]  ",
            Severity::Warn => "\x1b[35m[WARN] ",
            Severity::Error => "\x1b[31m[ERROR]",
            Severity::Event => "\x1b[36m[EVENT]",
        }
    }
}
