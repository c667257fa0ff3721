use crate::logging::Severity;

/// Terminal/live status of a ledger entry (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackStatus {
    Playing,
    Completed,
    Preempted,
    Stopped,
}

/// An immutable record of one playback's lifecycle, appended to on every
/// state transition (§4.9).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub cue_id: String,
    pub category_id: Option<String>,
    pub bus_id: String,
    pub severity: Severity,
    pub started_at_seconds: f64,
    pub ended_at_seconds: Option<f64>,
    pub stop_reason: Option<String>,
    pub status: PlaybackStatus,
    pub metadata: Option<String>,
    pub ducking: Vec<(String, f64)>,
}
