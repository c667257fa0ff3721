use crate::panels::PanelSwitchPosition;
use crate::resources::{EffectMap, Tank};

/// A tagged manual action (§3: "Manual Action").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ManualActionKind {
    ChecklistAck { event_id: String, count: usize, actor: String },
    ResourceDelta { effect: EffectMap },
    PropellantBurn { tank: Tank, amount_kg: f64 },
    DskyEntry { verb: u32, noun: u32, program: u32, registers: [f64; 2] },
    PanelControl { switch_id: Option<String>, position: Option<PanelSwitchPosition>, active_panel: Option<String> },
}

/// A queued manual action, with retry bookkeeping.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManualAction {
    pub kind: ManualActionKind,
    pub get_seconds: f64,
    pub insertion_index: u64,
    pub retry_until_seconds: Option<f64>,
    pub retry_interval_seconds: f64,
    pub next_attempt_seconds: f64,
}

/// Terminal outcome of a manual action, retained in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, serde::Serialize, serde::Deserialize)]
pub enum ManualActionOutcome {
    Succeeded,
    Expired,
}

/// A retained record of a completed/expired manual action.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManualActionRecord {
    pub label: String,
    pub outcome: ManualActionOutcome,
    pub get_seconds: f64,
    pub attempts: u32,
}
