//! The Checklist Manager (C4): per-event step acknowledgement tracking and
//! auto-advance timing (§4.4 of the design spec).

mod step;

pub use step::{ChecklistDefinition, ChecklistStepDefinition, StepState};

use crate::logging::MissionLogger;
use crate::score::ScoreSystem;
use std::collections::HashMap;

/// Tunables for the step duration formula (§4.4).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ChecklistTiming {
    pub min_step_duration_seconds: f64,
    pub default_step_duration_seconds: f64,
    pub safety_margin_seconds: f64,
}

impl Default for ChecklistTiming {
    fn default() -> Self {
        Self { min_step_duration_seconds: 2.0, default_step_duration_seconds: 15.0, safety_margin_seconds: 5.0 }
    }
}

/// Live per-event checklist runtime: step states plus the auto-advance
/// step duration computed at activation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChecklistRuntime {
    pub crew_role: String,
    pub steps: Vec<StepState>,
    pub step_duration_seconds: f64,
    pub start_get_seconds: f64,
    pub auto_advance: bool,
    pub audio_cue_complete: Option<String>,
}

impl ChecklistRuntime {
    /// True once every step carries `acknowledged = true`.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.steps.iter().all(|s| s.acknowledged) }

    fn first_unacknowledged(&self) -> Option<usize> { self.steps.iter().position(|s| !s.acknowledged) }
}

/// Tracks a live checklist runtime per active event.
#[derive(Debug, Clone, Default)]
pub struct ChecklistManager {
    definitions: HashMap<String, ChecklistDefinition>,
    runtimes: HashMap<String, ChecklistRuntime>,
}

impl ChecklistManager {
    #[must_use]
    pub fn new(definitions: Vec<ChecklistDefinition>) -> Self {
        Self { definitions: definitions.into_iter().map(|d| (d.id.clone(), d)).collect(), runtimes: HashMap::new() }
    }

    /// Whether `event_id` references a known checklist id.
    #[must_use]
    pub fn has_checklist(&self, checklist_id: &str) -> bool { self.definitions.contains_key(checklist_id) }

    /// Activates the checklist named `checklist_id` for `event_id` (§4.4).
    /// `auto_advance` drives whether unacknowledged steps synthesize their
    /// own acknowledgement at `start + k * step_duration`.
    pub fn activate(
        &mut self,
        event_id: &str,
        checklist_id: &str,
        get_seconds: f64,
        expected_duration_seconds: f64,
        window_close_seconds: f64,
        auto_advance: bool,
        timing: ChecklistTiming,
        logger: &mut MissionLogger,
    ) -> bool {
        let Some(def) = self.definitions.get(checklist_id) else {
            logger.warn(get_seconds, "checklist", "checklist_manager", format!("unknown checklist id {checklist_id} for event {event_id}"));
            return false;
        };
        let total_steps = def.steps.len().max(1) as f64;
        let window = (window_close_seconds - get_seconds).max(0.0);
        let bounded = expected_duration_seconds.min(window);
        let step_duration = timing
            .default_step_duration_seconds
            .min(((bounded - timing.safety_margin_seconds).max(0.0)) / total_steps)
            .max(timing.min_step_duration_seconds);
        let runtime = ChecklistRuntime {
            crew_role: def.crew_role.clone(),
            steps: def.steps.iter().map(|_| StepState::default()).collect(),
            step_duration_seconds: step_duration,
            start_get_seconds: get_seconds,
            auto_advance,
            audio_cue_complete: def.audio_cue_complete.clone(),
        };
        logger.note(get_seconds, "checklist", "checklist_manager", format!("activated {checklist_id} for event {event_id} ({} steps, {step_duration:.2}s/step)", def.steps.len()));
        self.runtimes.insert(event_id.to_string(), runtime);
        true
    }

    /// Advances auto-advance timers for every live runtime.
    pub fn update(&mut self, get_seconds: f64, score: &mut ScoreSystem, logger: &mut MissionLogger) {
        for (event_id, runtime) in &mut self.runtimes {
            if !runtime.auto_advance {
                continue;
            }
            loop {
                let Some(idx) = runtime.first_unacknowledged() else { break };
                let due_at = runtime.start_get_seconds + (idx as f64 + 1.0) * runtime.step_duration_seconds;
                if get_seconds + crate::time::EPSILON < due_at {
                    break;
                }
                runtime.steps[idx].acknowledged = true;
                runtime.steps[idx].acknowledged_at_seconds = Some(get_seconds);
                runtime.steps[idx].actor = Some("auto_advance".to_string());
                score.record_acknowledged_step();
                logger.note(get_seconds, "checklist", "checklist_manager", format!("{event_id} step {idx} auto-acknowledged"));
            }
        }
    }

    /// Manually acknowledges `step_number` (0-based) for `event_id`. Only
    /// accepted if every prior step is already acknowledged (§4.4).
    #[allow(clippy::too_many_arguments)]
    pub fn acknowledge(
        &mut self,
        event_id: &str,
        step_number: usize,
        actor: &str,
        get_seconds: f64,
        score: &mut ScoreSystem,
        logger: &mut MissionLogger,
    ) -> bool {
        let Some(runtime) = self.runtimes.get_mut(event_id) else {
            logger.warn(get_seconds, "checklist", "checklist_manager", format!("acknowledge on {event_id} with no active checklist"));
            return false;
        };
        if step_number >= runtime.steps.len() {
            logger.warn(get_seconds, "checklist", "checklist_manager", format!("{event_id} step {step_number} out of range"));
            return false;
        }
        if runtime.steps[..step_number].iter().any(|s| !s.acknowledged) {
            logger.warn(get_seconds, "checklist", "checklist_manager", format!("{event_id} step {step_number} acknowledged out of order"));
            return false;
        }
        if runtime.steps[step_number].acknowledged {
            return true;
        }
        runtime.steps[step_number].acknowledged = true;
        runtime.steps[step_number].acknowledged_at_seconds = Some(get_seconds);
        runtime.steps[step_number].actor = Some(actor.to_string());
        score.record_acknowledged_step();
        if actor != "auto_advance" {
            score.record_manual_step();
        }
        logger.note(get_seconds, "checklist", "checklist_manager", format!("{event_id} step {step_number} acknowledged by {actor}"));
        true
    }

    /// Whether every step of `event_id`'s checklist is acknowledged. An
    /// event with no active checklist vacuously satisfies the gate.
    #[must_use]
    pub fn is_event_complete(&self, event_id: &str) -> bool {
        self.runtimes.get(event_id).is_none_or(ChecklistRuntime::is_complete)
    }

    /// Finalises (removes) the runtime for `event_id`, regardless of
    /// completion state; called when its owning event leaves `active`.
    pub fn finish(&mut self, event_id: &str) -> Option<ChecklistRuntime> { self.runtimes.remove(event_id) }

    /// Read-only access to a live runtime, for HUD/frame rendering.
    #[must_use]
    pub fn runtime(&self, event_id: &str) -> Option<&ChecklistRuntime> { self.runtimes.get(event_id) }

    /// Number of checklists currently active, for the kernel run summary.
    #[must_use]
    pub fn active_count(&self) -> usize { self.runtimes.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def() -> ChecklistDefinition {
        ChecklistDefinition {
            id: "P23".to_string(),
            title: "Cislunar navigation".to_string(),
            crew_role: "CMP".to_string(),
            nominal_get_seconds: 0.0,
            steps: vec![
                ChecklistStepDefinition { action: "sight star".into(), expected_response: "mark".into(), reference: "p23".into() },
                ChecklistStepDefinition { action: "log mark".into(), expected_response: "logged".into(), reference: "p23".into() },
            ],
            audio_cue_complete: None,
        }
    }

    #[test]
    fn manual_ack_requires_prior_steps_first() {
        let mut mgr = ChecklistManager::new(vec![def()]);
        let mut score = ScoreSystem::new(crate::score::ScoreConfig::default());
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        mgr.activate("evt1", "P23", 0.0, 60.0, 600.0, false, ChecklistTiming::default(), &mut logger);
        assert!(!mgr.acknowledge("evt1", 1, "CMP", 1.0, &mut score, &mut logger));
        assert!(mgr.acknowledge("evt1", 0, "CMP", 1.0, &mut score, &mut logger));
        assert!(mgr.acknowledge("evt1", 1, "CMP", 2.0, &mut score, &mut logger));
        assert!(mgr.is_event_complete("evt1"));
        assert_eq!(score.summary().manual_score, 1.0);
    }

    #[test]
    fn auto_advance_acknowledges_on_schedule() {
        let mut mgr = ChecklistManager::new(vec![def()]);
        let mut score = ScoreSystem::new(crate::score::ScoreConfig::default());
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        mgr.activate("evt1", "P23", 0.0, 60.0, 600.0, true, ChecklistTiming::default(), &mut logger);
        let step_dur = mgr.runtime("evt1").unwrap().step_duration_seconds;
        mgr.update(0.0, &mut score, &mut logger);
        assert!(!mgr.is_event_complete("evt1"));
        mgr.update(step_dur + 0.01, &mut score, &mut logger);
        mgr.update(2.0 * step_dur + 0.01, &mut score, &mut logger);
        assert!(mgr.is_event_complete("evt1"));
        // Every step here was auto-advanced, so none count as manual.
        assert_eq!(score.summary().manual_score, 0.0);
    }

    #[test]
    fn event_with_no_active_checklist_is_vacuously_complete() {
        let mgr = ChecklistManager::new(vec![]);
        assert!(mgr.is_event_complete("no_such_event"));
    }
}
