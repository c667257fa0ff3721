//! The Event Scheduler (C8): event state machine, prerequisite gating, and
//! failure handling (§4.3 of the design spec). Drives checklist
//! auto-advance and autopilot start/finish as part of its own per-tick
//! update, per the strict pipeline order in §2.

mod event;

pub use event::{EventDefinition, EventRuntime, EventState};

/// A tally of events by state (§6: "events { counts, upcoming }").
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct EventCounts {
    pub pending: u64,
    pub armed: u64,
    pub active: u64,
    pub complete: u64,
    pub failed: u64,
    pub blocked: u64,
}

use crate::audio::AudioCueBinder;
use crate::autopilot::{AutopilotDefinition, AutopilotRunner, AutopilotSummary};
use crate::checklist::{ChecklistDefinition, ChecklistManager, ChecklistTiming};
use crate::logging::{MissionLogger, Severity};
use crate::panels::AgcState;
use crate::rcs::RcsController;
use crate::resources::{EffectOrigin, ResourceSystem};
use crate::score::{EventOutcome, ScoreSystem};
use std::collections::HashSet;

/// The live scheduler: sorted event runtimes plus the checklist timing
/// configuration used at activation.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    events: Vec<EventRuntime>,
    checklist_timing: ChecklistTiming,
    auto_advance_checklists: bool,
}

impl EventScheduler {
    /// Builds a scheduler from the static event list plus the autopilot and
    /// checklist catalogs used to compute `expectedDurationSeconds` and
    /// detect unresolvable prerequisites (§4.3).
    #[must_use]
    pub fn new(
        mut definitions: Vec<EventDefinition>,
        autopilots: &[AutopilotDefinition],
        checklists: &[ChecklistDefinition],
        checklist_timing: ChecklistTiming,
        auto_advance_checklists: bool,
        logger: &mut MissionLogger,
    ) -> Self {
        definitions.sort_by(|a, b| a.get_open_seconds.partial_cmp(&b.get_open_seconds).unwrap());
        let known_ids: HashSet<String> = definitions.iter().map(|d| d.id.clone()).collect();

        let events = definitions
            .into_iter()
            .map(|def| {
                let autopilot_duration = def.autopilot_id.as_deref().and_then(|id| autopilots.iter().find(|a| a.id == id)).map(AutopilotDefinition::duration_seconds);
                let checklist_steps = def.checklist_id.as_deref().and_then(|id| checklists.iter().find(|c| c.id == id)).map(|c| c.steps.len());
                let expected_duration_seconds = event::expected_duration_seconds(&def, autopilot_duration, checklist_steps);
                let blocked = def.prerequisites.iter().any(|p| !known_ids.contains(p));
                if blocked {
                    logger.warn(def.get_open_seconds, "scheduler", "event_scheduler", format!("event {} has an unresolvable prerequisite, permanently blocked", def.id));
                }
                let state = if blocked { EventState::Blocked } else { EventState::Pending };
                EventRuntime { definition: def, state, expected_duration_seconds, activation_get_seconds: None }
            })
            .collect();

        Self { events, checklist_timing, auto_advance_checklists }
    }

    /// Read-only access to every event runtime, in scheduling order.
    #[must_use]
    pub fn events(&self) -> &[EventRuntime] { &self.events }

    /// A tally of events by state, for the kernel run summary.
    #[must_use]
    pub fn counts(&self) -> EventCounts {
        let mut counts = EventCounts::default();
        for event in &self.events {
            match event.state {
                EventState::Pending => counts.pending += 1,
                EventState::Armed => counts.armed += 1,
                EventState::Active => counts.active += 1,
                EventState::Complete => counts.complete += 1,
                EventState::Failed => counts.failed += 1,
                EventState::Blocked => counts.blocked += 1,
            }
        }
        counts
    }

    /// The ids of every event not yet in a terminal state, in scheduling
    /// order, for the kernel run summary's "upcoming" list.
    #[must_use]
    pub fn upcoming(&self) -> Vec<String> {
        self.events
            .iter()
            .filter(|e| matches!(e.state, EventState::Pending | EventState::Armed | EventState::Active))
            .map(|e| e.definition.id.clone())
            .collect()
    }

    fn prerequisites_complete(&self, ids: &[String]) -> bool {
        ids.iter().all(|id| self.events.iter().any(|e| &e.definition.id == id && e.state == EventState::Complete))
    }

    /// Advances every event by one tick (§4.3), in sorted `(getOpenSeconds,
    /// insertion order)` order, driving checklist auto-advance and
    /// autopilot start/finish along the way. Returns every autopilot
    /// summary produced by a *natural* completion this tick (forced
    /// completions at event-complete are applied inline to resources but
    /// still returned, so the orbit propagator's subscription sees every
    /// completed burn).
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        get_seconds: f64,
        checklist: &mut ChecklistManager,
        autopilot: &mut AutopilotRunner,
        resources: &mut ResourceSystem,
        rcs: &mut RcsController,
        agc: &mut AgcState,
        audio: &mut AudioCueBinder,
        score: &mut ScoreSystem,
        logger: &mut MissionLogger,
    ) -> Vec<AutopilotSummary> {
        let ids: Vec<String> = self.events.iter().map(|e| e.definition.id.clone()).collect();

        for id in &ids {
            self.arm_and_activate(id, get_seconds, checklist, autopilot, audio, logger);
        }

        checklist.update(get_seconds, score, logger);
        let mut summaries = autopilot.update(resources, rcs, agc, get_seconds, logger);

        for id in &ids {
            self.check_completion_and_failure(id, get_seconds, checklist, autopilot, resources, rcs, agc, audio, score, logger, &mut summaries);
        }

        summaries
    }

    fn arm_and_activate(
        &mut self,
        id: &str,
        get_seconds: f64,
        checklist: &mut ChecklistManager,
        autopilot: &mut AutopilotRunner,
        audio: &mut AudioCueBinder,
        logger: &mut MissionLogger,
    ) {
        let prereqs_complete = {
            let Some(event) = self.events.iter().find(|e| e.definition.id == id) else { return };
            if event.state != EventState::Pending {
                return;
            }
            if get_seconds + crate::time::EPSILON < event.definition.get_open_seconds {
                return;
            }
            self.prerequisites_complete(&event.definition.prerequisites)
        };
        if !prereqs_complete {
            return;
        }

        let Some(event) = self.events.iter_mut().find(|e| e.definition.id == id) else { return };
        event.state = EventState::Armed;
        let def = event.definition.clone();
        let expected_duration = event.expected_duration_seconds;
        event.state = EventState::Active;
        event.activation_get_seconds = Some(get_seconds);

        logger.event(get_seconds, "scheduler", "event_scheduler", format!("{id} activated"));

        if let Some(checklist_id) = &def.checklist_id {
            checklist.activate(id, checklist_id, get_seconds, expected_duration, def.get_close_seconds, self.auto_advance_checklists, self.checklist_timing, logger);
        }
        if let Some(autopilot_id) = &def.autopilot_id {
            autopilot.start(id, autopilot_id, get_seconds, logger);
        }
        if let Some(cue_id) = &def.audio_cue_id {
            audio.enqueue(cue_id, get_seconds, Severity::Event, Some(id.to_string()));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_completion_and_failure(
        &mut self,
        id: &str,
        get_seconds: f64,
        checklist: &mut ChecklistManager,
        autopilot: &mut AutopilotRunner,
        resources: &mut ResourceSystem,
        rcs: &mut RcsController,
        agc: &mut AgcState,
        audio: &mut AudioCueBinder,
        score: &mut ScoreSystem,
        logger: &mut MissionLogger,
        summaries: &mut Vec<AutopilotSummary>,
    ) {
        let Some(event) = self.events.iter().find(|e| e.definition.id == id) else { return };
        if matches!(event.state, EventState::Pending | EventState::Blocked) {
            let def = event.definition.clone();
            if get_seconds > def.get_close_seconds + crate::time::EPSILON {
                resources.apply_effect(&def.failure_effects, get_seconds, "event_scheduler", EffectOrigin::Failure, logger);
                score.record_event_outcome(EventOutcome::Failed, def.is_comms);
                logger.error(get_seconds, "scheduler", "event_scheduler", format!("{id} failed: window closed without arming"));
                if let Some(event) = self.events.iter_mut().find(|e| e.definition.id == id) {
                    event.state = EventState::Failed;
                }
            }
            return;
        }
        if event.state != EventState::Active {
            return;
        }
        let def = event.definition.clone();
        let activation = event.activation_get_seconds.unwrap_or(get_seconds);
        let expected_duration = event.expected_duration_seconds;

        if get_seconds > def.get_close_seconds + crate::time::EPSILON {
            resources.apply_effect(&def.failure_effects, get_seconds, "event_scheduler", EffectOrigin::Failure, logger);
            checklist.finish(id);
            autopilot.abort(id, get_seconds, "event window closed", logger);
            score.record_event_outcome(EventOutcome::Failed, def.is_comms);
            logger.error(get_seconds, "scheduler", "event_scheduler", format!("{id} failed: window closed"));
            if let Some(event) = self.events.iter_mut().find(|e| e.definition.id == id) {
                event.state = EventState::Failed;
            }
            return;
        }

        let timer_satisfied = get_seconds - activation >= expected_duration - crate::time::EPSILON;
        let checklist_satisfied = checklist.is_event_complete(id);
        if !(timer_satisfied && checklist_satisfied) {
            return;
        }

        if autopilot.is_active(id) {
            if let Some(summary) = autopilot.finish(id, resources, rcs, agc, get_seconds, logger) {
                summaries.push(summary);
            }
        }
        resources.apply_effect(&def.success_effects, get_seconds, "event_scheduler", EffectOrigin::Success, logger);
        if let Some(runtime) = checklist.finish(id) {
            if let Some(cue_id) = runtime.audio_cue_complete {
                audio.enqueue(&cue_id, get_seconds, Severity::Event, Some(id.to_string()));
            }
        }
        score.record_event_outcome(EventOutcome::Completed, def.is_comms);
        logger.event(get_seconds, "scheduler", "event_scheduler", format!("{id} completed"));
        if let Some(event) = self.events.iter_mut().find(|e| e.definition.id == id) {
            event.state = EventState::Complete;
        }
    }
}
