use crate::orbit::{OrbitalElements, StateVector};
use crate::panels::{AgcState, PanelState};
use crate::resources::ResourceSnapshot;
use crate::scheduler::EventCounts;
use crate::score::ScoreSummary;

/// A point-in-time telemetry frame, suitable for an external adapter to
/// stream over SSE or render into a HUD (§6). Produced independently of the
/// end-of-run [`super::Summary`], at the cadence configured in
/// [`super::KernelConfig`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct Frame {
    pub get_seconds: f64,
    pub event_counts: EventCounts,
    pub resources: ResourceSnapshot,
    pub orbit_state: StateVector,
    pub orbit_elements: OrbitalElements,
    pub panels: PanelState,
    pub agc: AgcState,
    pub score: ScoreSummary,
}
