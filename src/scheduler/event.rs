use crate::resources::EffectMap;

/// A statically-defined mission event (§3: implied by "Event Scheduler").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventDefinition {
    pub id: String,
    pub get_open_seconds: f64,
    pub get_close_seconds: f64,
    pub prerequisites: Vec<String>,
    pub autopilot_id: Option<String>,
    pub checklist_id: Option<String>,
    pub success_effects: EffectMap,
    pub failure_effects: EffectMap,
    pub audio_cue_id: Option<String>,
    pub is_comms: bool,
}

/// The event state machine's states (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum EventState {
    Pending,
    Armed,
    Active,
    Complete,
    Failed,
    /// A prerequisite could not be resolved to a known event id at
    /// construction time; the event can never arm (§4.3).
    Blocked,
}

/// Live per-event state, in addition to its static definition.
#[derive(Debug, Clone)]
pub struct EventRuntime {
    pub definition: EventDefinition,
    pub state: EventState,
    pub expected_duration_seconds: f64,
    pub activation_get_seconds: Option<f64>,
}

/// Priority order for `expectedDurationSeconds` (§4.3): autopilot duration,
/// then a checklist-based estimate, then half the event window clamped to
/// `[5, 600]`, then a flat fallback.
#[must_use]
pub fn expected_duration_seconds(
    def: &EventDefinition,
    autopilot_duration: Option<f64>,
    checklist_step_count: Option<usize>,
) -> f64 {
    if let Some(d) = autopilot_duration {
        return d;
    }
    if let Some(steps) = checklist_step_count {
        // A rough per-step estimate; refined once the checklist manager
        // computes its own step duration at activation time.
        return (steps as f64) * 15.0;
    }
    let window = (def.get_close_seconds - def.get_open_seconds).max(0.0) / 2.0;
    if window > 0.0 {
        return window.clamp(5.0, 600.0);
    }
    120.0
}
