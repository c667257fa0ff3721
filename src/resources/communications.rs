use super::state::ResourceState;
use crate::audio::AudioCueBinder;
use crate::logging::{MissionLogger, Severity};

/// A scheduled ground-station contact window.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommsPass {
    pub station: String,
    pub get_open_seconds: f64,
    pub get_close_seconds: f64,
    pub power_margin_delta_kw: f64,
    pub signal_quality_pct: f64,
    pub downlink_mbps: f64,
    pub acquire_audio_cue_id: Option<String>,
}

/// The fields of `resources.communications` in the data model: currently
/// active pass (if any) plus progress/remaining-time bookkeeping and the
/// next upcoming window.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommsFields {
    pub active_station: Option<String>,
    pub signal_quality_pct: f64,
    pub downlink_mbps: f64,
    pub load_delta_kw: f64,
    pub time_remaining_seconds: f64,
    pub time_since_open_seconds: f64,
    pub progress_fraction: f64,
    pub next_window_station: Option<String>,
    pub next_window_open_seconds: Option<f64>,
}

impl CommsFields {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            active_station: None,
            signal_quality_pct: 0.0,
            downlink_mbps: 0.0,
            load_delta_kw: 0.0,
            time_remaining_seconds: 0.0,
            time_since_open_seconds: 0.0,
            progress_fraction: 0.0,
            next_window_station: None,
            next_window_open_seconds: None,
        }
    }
}

/// The schedule-driven communications state machine (§4.2.1).
#[derive(Debug, Clone)]
pub struct CommunicationsState {
    schedule: Vec<CommsPass>,
    active_index: Option<usize>,
    applied_load_delta_kw: f64,
}

impl CommunicationsState {
    #[must_use]
    pub fn new(mut schedule: Vec<CommsPass>) -> Self {
        schedule.sort_by(|a, b| a.get_open_seconds.partial_cmp(&b.get_open_seconds).unwrap());
        Self { schedule, active_index: None, applied_load_delta_kw: 0.0 }
    }

    /// Finds the index of the pass whose `[open, close)` window contains
    /// `get_seconds`, if any.
    fn find_active(&self, get_seconds: f64) -> Option<usize> {
        self.schedule.iter().position(|p| get_seconds >= p.get_open_seconds && get_seconds < p.get_close_seconds)
    }

    /// Finds the next pass opening strictly after `get_seconds`.
    fn find_next(&self, get_seconds: f64) -> Option<&CommsPass> {
        self.schedule.iter().find(|p| p.get_open_seconds > get_seconds)
    }

    pub fn update(&mut self, get_seconds: f64, state: &mut ResourceState, audio: &mut AudioCueBinder, logger: &mut MissionLogger) {
        let now_idx = self.find_active(get_seconds);
        if now_idx != self.active_index {
            if let Some(old_idx) = self.active_index {
                state.power.fuel_cell_load_kw -= self.applied_load_delta_kw;
                self.applied_load_delta_kw = 0.0;
                logger.note(get_seconds, "communications", "comms_state_machine", format!("exited pass with {}", self.schedule[old_idx].station));
            }
            if let Some(new_idx) = now_idx {
                let pass = &self.schedule[new_idx];
                self.applied_load_delta_kw = -pass.power_margin_delta_kw;
                state.power.fuel_cell_load_kw += self.applied_load_delta_kw;
                logger.note(get_seconds, "communications", "comms_state_machine", format!("acquired {}", pass.station));
                if let Some(cue_id) = &pass.acquire_audio_cue_id {
                    audio.enqueue(cue_id, get_seconds, Severity::Event, Some(pass.station.clone()));
                }
            }
            self.active_index = now_idx;
        }

        let fields = &mut state.communications;
        if let Some(idx) = self.active_index {
            let pass = &self.schedule[idx];
            let since_open = get_seconds - pass.get_open_seconds;
            let remaining = (pass.get_close_seconds - get_seconds).max(0.0);
            let span = (pass.get_close_seconds - pass.get_open_seconds).max(1e-9);
            fields.active_station = Some(pass.station.clone());
            fields.signal_quality_pct = pass.signal_quality_pct;
            fields.downlink_mbps = pass.downlink_mbps;
            fields.load_delta_kw = self.applied_load_delta_kw;
            fields.time_since_open_seconds = since_open;
            fields.time_remaining_seconds = remaining;
            fields.progress_fraction = crate::math::clamp(since_open / span, 0.0, 1.0);
        } else {
            fields.active_station = None;
            fields.signal_quality_pct = 0.0;
            fields.downlink_mbps = 0.0;
            fields.load_delta_kw = 0.0;
            fields.time_since_open_seconds = 0.0;
            fields.time_remaining_seconds = 0.0;
            fields.progress_fraction = 0.0;
        }
        if let Some(next) = self.find_next(get_seconds) {
            fields.next_window_station = Some(next.station.clone());
            fields.next_window_open_seconds = Some(next.get_open_seconds);
        } else {
            fields.next_window_station = None;
            fields.next_window_open_seconds = None;
        }
    }

    /// The currently active pass, if any.
    #[must_use]
    pub fn active_pass(&self) -> Option<&CommsPass> { self.active_index.map(|i| &self.schedule[i]) }

    /// The full schedule, sorted by opening time.
    #[must_use]
    pub fn schedule(&self) -> &[CommsPass] { &self.schedule }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ResourceState { ResourceState::nominal() }

    #[test]
    fn enters_and_exits_pass_applying_and_restoring_load() {
        let pass = CommsPass {
            station: "MSFN-1".into(),
            get_open_seconds: 10.0,
            get_close_seconds: 20.0,
            power_margin_delta_kw: 2.0,
            signal_quality_pct: 95.0,
            downlink_mbps: 1.0,
            acquire_audio_cue_id: None,
        };
        let mut comms = CommunicationsState::new(vec![pass]);
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        let mut audio = AudioCueBinder::new();
        let mut st = state();
        let base_load = st.power.fuel_cell_load_kw;

        comms.update(5.0, &mut st, &mut audio, &mut logger);
        assert!((st.power.fuel_cell_load_kw - base_load).abs() < 1e-9);

        comms.update(12.0, &mut st, &mut audio, &mut logger);
        assert!((st.power.fuel_cell_load_kw - (base_load - 2.0)).abs() < 1e-9);
        assert_eq!(st.communications.active_station.as_deref(), Some("MSFN-1"));

        comms.update(25.0, &mut st, &mut audio, &mut logger);
        assert!((st.power.fuel_cell_load_kw - base_load).abs() < 1e-9);
        assert!(st.communications.active_station.is_none());
    }

    #[test]
    fn acquiring_a_pass_enqueues_its_configured_audio_cue() {
        let pass = CommsPass {
            station: "MSFN-1".into(),
            get_open_seconds: 10.0,
            get_close_seconds: 20.0,
            power_margin_delta_kw: 2.0,
            signal_quality_pct: 95.0,
            downlink_mbps: 1.0,
            acquire_audio_cue_id: Some("comms_acquire".into()),
        };
        let mut comms = CommunicationsState::new(vec![pass]);
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        let mut audio = AudioCueBinder::new();
        let mut st = state();

        comms.update(12.0, &mut st, &mut audio, &mut logger);
        let pending = audio.drain();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].cue_id, "comms_acquire");
    }
}
