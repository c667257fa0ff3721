use crate::orbit::BurnFrame;

/// Terminal status of an autopilot runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, serde::Serialize, serde::Deserialize)]
pub enum AutopilotStatus {
    Completed,
    Failed,
    Aborted,
}

/// Deviations between achieved and scripted burn metrics, populated when
/// the autopilot definition carries tolerances (§4.5).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct BurnDeviations {
    pub burn_duration_seconds: Option<f64>,
    pub propellant_kg: Option<f64>,
    pub delta_v_mps: Option<f64>,
}

/// Achieved burn metrics, accumulated over the life of the runtime.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct BurnMetrics {
    pub propellant_kg_used: f64,
    pub delta_v_mps: f64,
    pub burn_duration_seconds: f64,
}

/// Emitted to every registered summary handler on completion, failure, or
/// abort (§4.5). The orbit propagator is one such handler (§4.7): it
/// applies `delta_v_mps` along `direction` for any summary with a nonzero
/// achieved delta-v.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AutopilotSummary {
    pub event_id: String,
    pub autopilot_id: String,
    pub metrics: BurnMetrics,
    pub deviations: BurnDeviations,
    pub direction: BurnFrame,
    pub status: AutopilotStatus,
    pub completed_at_seconds: f64,
}
