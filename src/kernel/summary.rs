use crate::autopilot::AutopilotStatus;
use crate::manual::ManualActionOutcome;
use crate::orbit::OrbitSummary;
use crate::resources::ResourceSnapshot;
use crate::scheduler::EventCounts;
use crate::score::ScoreSummary;

/// Checklist-related stats for the run summary (§6).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ChecklistStats {
    pub active_checklists: usize,
}

/// Manual action queue stats for the run summary (§6).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ManualActionStats {
    pub pending: usize,
    pub succeeded: u64,
    pub expired: u64,
}

/// Autopilot runner stats for the run summary (§6).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct AutopilotStats {
    pub active: usize,
    pub completed: u64,
    pub failed: u64,
    pub aborted: u64,
}

impl AutopilotStats {
    pub(crate) fn record(&mut self, status: AutopilotStatus) {
        match status {
            AutopilotStatus::Completed => self.completed += 1,
            AutopilotStatus::Failed => self.failed += 1,
            AutopilotStatus::Aborted => self.aborted += 1,
        }
    }
}

/// RCS controller stats for the run summary (§6).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct RcsStats {
    pub total_pulses: u64,
    pub total_impulse_ns: f64,
}

/// Audio binder/dispatcher stats for the run summary (§6).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct AudioStats {
    pub suppressed_triggers: u64,
    pub ledger_entries: usize,
}

/// Events section of the run summary (§6).
#[derive(Debug, Clone, serde::Serialize)]
pub struct EventsSummary {
    pub counts: EventCounts,
    pub upcoming: Vec<String>,
}

/// The structured record emitted at the end of a run (§6).
#[derive(Debug, Clone, serde::Serialize)]
pub struct Summary {
    pub ticks: u64,
    pub final_get_seconds: f64,
    pub events: EventsSummary,
    pub resources: ResourceSnapshot,
    pub checklists: ChecklistStats,
    pub manual_actions: ManualActionStats,
    pub autopilot: AutopilotStats,
    pub rcs: RcsStats,
    pub orbit: OrbitSummary,
    pub audio: AudioStats,
    pub score: ScoreSummary,
}

/// Retained only to reference the outcome type this module summarizes
/// against; the manual action queue's own history carries the detail.
pub(crate) fn count_outcomes(history: &[crate::manual::ManualActionRecord]) -> (u64, u64) {
    let succeeded = history.iter().filter(|r| r.outcome == ManualActionOutcome::Succeeded).count() as u64;
    let expired = history.iter().filter(|r| r.outcome == ManualActionOutcome::Expired).count() as u64;
    (succeeded, expired)
}
