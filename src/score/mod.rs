//! The Score System (C11): running resource extrema, fault/event tallies,
//! and the commander-score rollup (§4.10 of the design spec).

mod config;
mod grade;

pub use config::{ScoreConfig, ScoreThresholds, ScoreWeights};
pub use grade::{grade_for, Grade};

use crate::logging::MissionLogger;
use crate::resources::ResourceSnapshot;

/// Terminal outcome of an event, as reported by the scheduler (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Completed,
    Failed,
}

/// A point-in-time sample of the commander score, retained for history
/// charts (§4.10).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ScoreSample {
    pub get_seconds: f64,
    pub commander_score: f64,
    pub grade: Grade,
}

/// The final computed rating (§4.10).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ScoreSummary {
    pub event_score: f64,
    pub resource_score: f64,
    pub fault_score: f64,
    pub manual_score: f64,
    pub base_score: f64,
    pub manual_bonus: f64,
    pub commander_score: f64,
    pub grade: Grade,
}

/// Live accumulators for the score system.
#[derive(Debug, Clone)]
pub struct ScoreSystem {
    config: ScoreConfig,
    min_power_margin_pct: f64,
    max_power_margin_pct: f64,
    min_delta_v_margin_mps: f64,
    max_delta_v_margin_mps: f64,
    thermal_violation_seconds: f64,
    thermal_violation_events: u64,
    was_in_thermal_violation: bool,
    events_completed: u64,
    events_total: u64,
    comms_events_completed: u64,
    comms_events_total: u64,
    total_faults: u64,
    manual_steps: u64,
    acknowledged_steps: u64,
    history: Vec<ScoreSample>,
    last_sampled_get_seconds: f64,
    last_commander_score: f64,
    last_grade: Grade,
}

impl ScoreSystem {
    #[must_use]
    pub fn new(config: ScoreConfig) -> Self {
        Self {
            config,
            min_power_margin_pct: f64::INFINITY,
            max_power_margin_pct: f64::NEG_INFINITY,
            min_delta_v_margin_mps: f64::INFINITY,
            max_delta_v_margin_mps: f64::NEG_INFINITY,
            thermal_violation_seconds: 0.0,
            thermal_violation_events: 0,
            was_in_thermal_violation: false,
            events_completed: 0,
            events_total: 0,
            comms_events_completed: 0,
            comms_events_total: 0,
            total_faults: 0,
            manual_steps: 0,
            acknowledged_steps: 0,
            history: Vec::new(),
            last_sampled_get_seconds: f64::NEG_INFINITY,
            last_commander_score: 0.0,
            last_grade: Grade::F,
        }
    }

    /// Refreshes resource extrema and thermal violation tracking from a
    /// resource snapshot, then samples history if due (§4.10).
    pub fn update(&mut self, dt_seconds: f64, get_seconds: f64, snapshot: &ResourceSnapshot, logger: &mut MissionLogger) {
        let power = snapshot.state.power_margin_pct;
        let delta_v = snapshot.state.delta_v_margin_mps;
        self.min_power_margin_pct = self.min_power_margin_pct.min(power);
        self.max_power_margin_pct = self.max_power_margin_pct.max(power);
        self.min_delta_v_margin_mps = self.min_delta_v_margin_mps.min(delta_v);
        self.max_delta_v_margin_mps = self.max_delta_v_margin_mps.max(delta_v);

        let in_violation = snapshot.state.cryo_boiloff_rate_pct_per_hr > self.config.thresholds.thermal_violation_rate_pct_per_hr;
        if in_violation {
            self.thermal_violation_seconds += dt_seconds;
            if !self.was_in_thermal_violation {
                self.thermal_violation_events += 1;
            }
        }
        self.was_in_thermal_violation = in_violation;
        self.total_faults = snapshot.failures.len() as u64;

        self.maybe_sample(get_seconds, logger);
    }

    /// Records an event's terminal transition for the completion tally,
    /// and the comms-subset tally when `is_comms` is set (§4.10).
    pub fn record_event_outcome(&mut self, outcome: EventOutcome, is_comms: bool) {
        self.events_total += 1;
        if is_comms {
            self.comms_events_total += 1;
        }
        if outcome == EventOutcome::Completed {
            self.events_completed += 1;
            if is_comms {
                self.comms_events_completed += 1;
            }
        }
    }

    /// Records one manually-driven checklist acknowledgement (actor not
    /// `auto_advance`).
    pub fn record_manual_step(&mut self) { self.manual_steps += 1; }

    /// Records one checklist acknowledgement regardless of actor.
    pub fn record_acknowledged_step(&mut self) { self.acknowledged_steps += 1; }

    fn maybe_sample(&mut self, get_seconds: f64, logger: &mut MissionLogger) {
        let summary = self.summary();
        let due_by_step = get_seconds - self.last_sampled_get_seconds >= self.config.sample_step_seconds;
        let grade_changed = summary.grade != self.last_grade;
        let delta = (summary.commander_score - self.last_commander_score).abs();
        let due_by_delta = delta >= self.config.delta_log_threshold;

        if due_by_step || grade_changed || due_by_delta {
            self.history.push(ScoreSample { get_seconds, commander_score: summary.commander_score, grade: summary.grade });
            self.last_sampled_get_seconds = get_seconds;
            if due_by_delta {
                logger.note(get_seconds, "score", "score_system", format!("commander score {:.1} -> {:.1}", self.last_commander_score, summary.commander_score));
            }
            self.last_commander_score = summary.commander_score;
            self.last_grade = summary.grade;
        }
    }

    /// Computes the current rating (§4.10). Safe to call at any time; does
    /// not mutate history (history sampling happens only in `update`).
    #[must_use]
    pub fn summary(&self) -> ScoreSummary {
        let w = self.config.weights;
        let t = self.config.thresholds;

        let event_score = if self.events_total == 0 { 1.0 } else { self.events_completed as f64 / self.events_total as f64 };

        let min_power = if self.min_power_margin_pct.is_finite() { self.min_power_margin_pct } else { 100.0 };
        let min_delta_v = if self.min_delta_v_margin_mps.is_finite() { self.min_delta_v_margin_mps } else { 0.0 };

        let resource_score = w.power * crate::math::ramp_up(min_power, t.power_warning_pct, t.power_ideal_pct)
            + w.delta_v * crate::math::ramp_up(min_delta_v, t.delta_v_failure_mps, t.delta_v_ideal_mps)
            + w.thermal * crate::math::ramp_down(self.thermal_violation_seconds, 0.0, t.thermal_critical_seconds);

        let fault_score = (1.0 - self.total_faults as f64 / self.config.fault_baseline.max(1.0)).max(0.0);

        let manual_score = if self.acknowledged_steps == 0 { 0.0 } else { self.manual_steps as f64 / self.acknowledged_steps as f64 };

        let base_score = 100.0 * (w.event * event_score + w.resource * resource_score + w.fault * fault_score);
        let manual_bonus = 100.0 * w.manual * manual_score;
        let commander_score = crate::math::clamp(base_score + manual_bonus, 0.0, 100.0);

        ScoreSummary {
            event_score,
            resource_score,
            fault_score,
            manual_score,
            base_score,
            manual_bonus,
            commander_score,
            grade: grade_for(commander_score),
        }
    }

    /// The retained score sample history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ScoreSample] { &self.history }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{PropulsionBudget, ResourceState, ResourceSystem};

    #[test]
    fn no_events_yields_full_event_score_and_no_faults_yields_full_fault_score() {
        let score = ScoreSystem::new(ScoreConfig::default());
        let summary = score.summary();
        assert!((summary.event_score - 1.0).abs() < 1e-9);
        assert!((summary.fault_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn thermal_violation_accumulates_and_lowers_resource_score() {
        let mut score = ScoreSystem::new(ScoreConfig::default());
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        let sys = ResourceSystem::new(ResourceState::nominal(), PropulsionBudget::default(), vec![]);
        let mut snapshot = sys.snapshot();
        snapshot.state.cryo_boiloff_rate_pct_per_hr = 4.0;
        let before = score.summary().resource_score;
        score.update(3700.0, 3700.0, &snapshot, &mut logger);
        let after = score.summary().resource_score;
        assert!(score.thermal_violation_seconds > 0.0);
        assert!(after <= before);
    }
}
