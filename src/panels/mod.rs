//! Panel State / Workspace / AGC (C13, thin): a record of switch positions
//! and DSKY entries, mutated by manual actions and autopilot `dsky_entry`
//! commands (§4.11 of the design spec). The core does not interpret AGC
//! programs or panel layouts — it only records what was keyed or switched.

mod panel_switch;

pub use panel_switch::PanelSwitchPosition;

use crate::logging::MissionLogger;
use std::collections::HashMap;

/// A map of named switch positions.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PanelState {
    pub switches: HashMap<String, PanelSwitchPosition>,
}

impl PanelState {
    /// Sets `switch_id` to `position`, creating the entry if new.
    pub fn set(&mut self, switch_id: &str, position: PanelSwitchPosition, get_seconds: f64, logger: &mut MissionLogger) {
        self.switches.insert(switch_id.to_string(), position);
        logger.note(get_seconds, "panels", "panel_state", format!("{switch_id} -> {position}"));
    }

    #[must_use]
    pub fn get(&self, switch_id: &str) -> Option<PanelSwitchPosition> { self.switches.get(switch_id).copied() }
}

/// The last-entered DSKY verb/noun/program and two scratch registers. A
/// record of what was keyed in; the AGC does not execute programs here
/// (out of scope — see §1).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct AgcState {
    pub verb: u32,
    pub noun: u32,
    pub program: u32,
    pub registers: [f64; 2],
    pub last_entry_get_seconds: Option<f64>,
}

impl AgcState {
    /// Records a DSKY entry.
    pub fn record_entry(&mut self, verb: u32, noun: u32, program: u32, registers: [f64; 2], get_seconds: f64) {
        self.verb = verb;
        self.noun = noun;
        self.program = program;
        self.registers = registers;
        self.last_entry_get_seconds = Some(get_seconds);
    }
}

/// The single active panel selection, switched by `panel_control` manual
/// actions. Unrecognised panel ids are logged and ignored rather than
/// rejected, since HUD layout is an external concern (§4.11).
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    known_panels: Vec<String>,
    active_panel: Option<String>,
}

impl Workspace {
    #[must_use]
    pub fn new(known_panels: Vec<String>) -> Self { Self { known_panels, active_panel: None } }

    #[must_use]
    pub fn active_panel(&self) -> Option<&str> { self.active_panel.as_deref() }

    pub fn set_active_panel(&mut self, panel_id: &str, get_seconds: f64, logger: &mut MissionLogger) {
        if !self.known_panels.is_empty() && !self.known_panels.iter().any(|p| p == panel_id) {
            logger.warn(get_seconds, "panels", "workspace", format!("unrecognised panel id {panel_id}, ignoring"));
            return;
        }
        self.active_panel = Some(panel_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognised_panel_id_is_ignored_not_rejected() {
        let mut ws = Workspace::new(vec!["main".to_string()]);
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        ws.set_active_panel("bogus", 0.0, &mut logger);
        assert!(ws.active_panel().is_none());
        ws.set_active_panel("main", 1.0, &mut logger);
        assert_eq!(ws.active_panel(), Some("main"));
    }

    #[test]
    fn agc_records_last_entry() {
        let mut agc = AgcState::default();
        agc.record_entry(37, 0, 0, [1.5, 0.0], 10.0);
        assert_eq!(agc.verb, 37);
        assert_eq!(agc.last_entry_get_seconds, Some(10.0));
    }
}
