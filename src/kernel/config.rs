use crate::checklist::ChecklistTiming;

/// Kernel construction options (§6). Carries no hidden global state; the
/// (out-of-scope) loader is responsible for producing one of these from
/// mission data.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct KernelConfig {
    pub tick_rate_hz: u32,
    pub log_interval_seconds: f64,
    pub auto_advance_checklists: bool,
    pub checklist_step_seconds: f64,
    pub frame_cadence_seconds: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            log_interval_seconds: 3600.0,
            auto_advance_checklists: true,
            checklist_step_seconds: 15.0,
            frame_cadence_seconds: 1.0,
        }
    }
}

impl KernelConfig {
    /// The checklist timing tunables implied by this configuration.
    #[must_use]
    pub fn checklist_timing(&self) -> ChecklistTiming {
        ChecklistTiming { default_step_duration_seconds: self.checklist_step_seconds, ..ChecklistTiming::default() }
    }
}
