//! The Manual Action Queue (C9): time-ordered scripted overrides with
//! bounded retries (§4.8 of the design spec).

mod action;

pub use action::{ManualAction, ManualActionKind, ManualActionOutcome, ManualActionRecord};

use crate::checklist::ChecklistManager;
use crate::logging::MissionLogger;
use crate::panels::{AgcState, PanelState, Workspace};
use crate::resources::{EffectOrigin, ResourceSystem};
use crate::score::ScoreSystem;
use std::collections::VecDeque;

/// Default retry cadence used when an action doesn't specify its own.
pub const DEFAULT_RETRY_INTERVAL_SECONDS: f64 = 2.0;

fn label(kind: &ManualActionKind) -> String {
    match kind {
        ManualActionKind::ChecklistAck { event_id, .. } => format!("checklist_ack({event_id})"),
        ManualActionKind::ResourceDelta { .. } => "resource_delta".to_string(),
        ManualActionKind::PropellantBurn { tank, amount_kg } => format!("propellant_burn({tank}, {amount_kg:.2}kg)"),
        ManualActionKind::DskyEntry { .. } => "dsky_entry".to_string(),
        ManualActionKind::PanelControl { .. } => "panel_control".to_string(),
    }
}

/// The strictly-ordered manual action queue: a retrying head blocks every
/// action behind it, matching a real command queue (§4.8).
#[derive(Debug, Clone, Default)]
pub struct ManualActionQueue {
    queue: VecDeque<ManualAction>,
    next_insertion_index: u64,
    history: Vec<ManualActionRecord>,
}

impl ManualActionQueue {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Enqueues `kind`, maintaining `(getSeconds, insertionIndex)` order.
    pub fn enqueue(&mut self, kind: ManualActionKind, get_seconds: f64, retry_until_seconds: Option<f64>, retry_interval_seconds: Option<f64>) {
        let action = ManualAction {
            kind,
            get_seconds,
            insertion_index: self.next_insertion_index,
            retry_until_seconds,
            retry_interval_seconds: retry_interval_seconds.unwrap_or(DEFAULT_RETRY_INTERVAL_SECONDS),
            next_attempt_seconds: get_seconds,
        };
        self.next_insertion_index += 1;
        let pos = self
            .queue
            .iter()
            .position(|a| (a.get_seconds, a.insertion_index) > (action.get_seconds, action.insertion_index))
            .unwrap_or(self.queue.len());
        self.queue.insert(pos, action);
    }

    /// Processes the head of the queue while it is due, in order, stopping
    /// as soon as the head is not yet due or has just been rescheduled
    /// (§4.8).
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        get_seconds: f64,
        checklist: &mut ChecklistManager,
        resources: &mut ResourceSystem,
        agc: &mut AgcState,
        panels: &mut PanelState,
        workspace: &mut Workspace,
        score: &mut ScoreSystem,
        logger: &mut MissionLogger,
    ) {
        while let Some(head) = self.queue.front() {
            if head.next_attempt_seconds > get_seconds + crate::time::EPSILON {
                break;
            }
            let mut action = self.queue.pop_front().unwrap();
            let outcome = execute(&action, get_seconds, checklist, resources, agc, panels, workspace, score, logger);
            match outcome {
                ExecOutcome::Done => {
                    self.history.push(ManualActionRecord { label: label(&action.kind), outcome: ManualActionOutcome::Succeeded, get_seconds, attempts: 1 });
                }
                ExecOutcome::Retry => {
                    let candidate = (get_seconds + action.retry_interval_seconds).max(action.next_attempt_seconds + action.retry_interval_seconds);
                    let expired = action.retry_until_seconds.is_some_and(|until| candidate > until + crate::time::EPSILON);
                    if expired {
                        logger.warn(get_seconds, "manual", "manual_action_queue", format!("{} expired after retries", label(&action.kind)));
                        self.history.push(ManualActionRecord { label: label(&action.kind), outcome: ManualActionOutcome::Expired, get_seconds, attempts: 1 });
                    } else {
                        action.next_attempt_seconds = candidate;
                        self.queue.push_front(action);
                        break;
                    }
                }
            }
        }
    }

    /// The retained execution history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ManualActionRecord] { &self.history }

    /// Number of actions still pending.
    #[must_use]
    pub fn pending_count(&self) -> usize { self.queue.len() }
}

enum ExecOutcome {
    Done,
    Retry,
}

#[allow(clippy::too_many_arguments)]
fn execute(
    action: &ManualAction,
    get_seconds: f64,
    checklist: &mut ChecklistManager,
    resources: &mut ResourceSystem,
    agc: &mut AgcState,
    panels: &mut PanelState,
    workspace: &mut Workspace,
    score: &mut ScoreSystem,
    logger: &mut MissionLogger,
) -> ExecOutcome {
    match &action.kind {
        ManualActionKind::ChecklistAck { event_id, count, actor } => {
            if checklist.runtime(event_id).is_none() {
                return ExecOutcome::Retry;
            }
            for _ in 0..*count {
                if let Some(runtime) = checklist.runtime(event_id) {
                    let Some(next_step) = runtime.steps.iter().position(|s| !s.acknowledged) else { break };
                    checklist.acknowledge(event_id, next_step, actor, get_seconds, score, logger);
                }
            }
            ExecOutcome::Done
        }
        ManualActionKind::ResourceDelta { effect } => {
            resources.apply_effect(effect, get_seconds, "manual_action_queue", EffectOrigin::Manual, logger);
            ExecOutcome::Done
        }
        ManualActionKind::PropellantBurn { tank, amount_kg } => {
            if resources.record_propellant_usage(*tank, *amount_kg, get_seconds, "manual_action_queue", logger) {
                ExecOutcome::Done
            } else {
                ExecOutcome::Retry
            }
        }
        ManualActionKind::DskyEntry { verb, noun, program, registers } => {
            agc.record_entry(*verb, *noun, *program, *registers, get_seconds);
            ExecOutcome::Done
        }
        ManualActionKind::PanelControl { switch_id, position, active_panel } => {
            if let (Some(switch_id), Some(position)) = (switch_id, position) {
                panels.set(switch_id, *position, get_seconds, logger);
            }
            if let Some(panel_id) = active_panel {
                workspace.set_active_panel(panel_id, get_seconds, logger);
            }
            ExecOutcome::Done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{PropulsionBudget, ResourceState, ResourceSystem, Tank};
    use crate::score::{ScoreConfig, ScoreSystem};

    #[test]
    fn propellant_burn_retries_until_it_can_be_satisfied() {
        let mut queue = ManualActionQueue::new();
        let mut checklist = ChecklistManager::new(vec![]);
        let mut resources = ResourceSystem::new(ResourceState::nominal(), PropulsionBudget::default(), vec![]);
        let mut agc = AgcState::default();
        let mut panels = PanelState::default();
        let mut workspace = Workspace::new(vec![]);
        let mut score = ScoreSystem::new(ScoreConfig::default());
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);

        // CSM RCS has 300kg nominal; ask for more than exists so the first
        // attempt must retry, then succeed once within bounds.
        queue.enqueue(ManualActionKind::PropellantBurn { tank: Tank::CsmRcs, amount_kg: 1000.0 }, 0.0, Some(100.0), Some(1.0));
        queue.update(0.0, &mut checklist, &mut resources, &mut agc, &mut panels, &mut workspace, &mut score, &mut logger);
        assert_eq!(queue.pending_count(), 1);
        assert!(queue.history().is_empty());

        queue.update(200.0, &mut checklist, &mut resources, &mut agc, &mut panels, &mut workspace, &mut score, &mut logger);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.history()[0].outcome, ManualActionOutcome::Expired);
    }

    #[test]
    fn checklist_ack_with_no_active_checklist_retries_then_expires() {
        let mut queue = ManualActionQueue::new();
        let mut checklist = ChecklistManager::new(vec![]);
        let mut resources = ResourceSystem::new(ResourceState::nominal(), PropulsionBudget::default(), vec![]);
        let mut agc = AgcState::default();
        let mut panels = PanelState::default();
        let mut workspace = Workspace::new(vec![]);
        let mut score = ScoreSystem::new(ScoreConfig::default());
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);

        queue.enqueue(ManualActionKind::ChecklistAck { event_id: "evt1".into(), count: 1, actor: "CDR".into() }, 0.0, Some(5.0), Some(1.0));
        queue.update(0.0, &mut checklist, &mut resources, &mut agc, &mut panels, &mut workspace, &mut score, &mut logger);
        assert_eq!(queue.pending_count(), 1);
        queue.update(10.0, &mut checklist, &mut resources, &mut agc, &mut panels, &mut workspace, &mut score, &mut logger);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.history()[0].outcome, ManualActionOutcome::Expired);
    }

    #[test]
    fn propellant_burn_succeeds_once_a_side_effect_refills_the_tank_mid_retry() {
        let mut state = ResourceState::nominal();
        state.propellant.lm_descent_kg = 0.0;
        let mut queue = ManualActionQueue::new();
        let mut checklist = ChecklistManager::new(vec![]);
        let mut resources = ResourceSystem::new(state, PropulsionBudget::default(), vec![]);
        let mut agc = AgcState::default();
        let mut panels = PanelState::default();
        let mut workspace = Workspace::new(vec![]);
        let mut score = ScoreSystem::new(ScoreConfig::default());
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);

        queue.enqueue(ManualActionKind::PropellantBurn { tank: Tank::LmDescent, amount_kg: 50.0 }, 0.0, Some(3.0), Some(1.0));

        queue.update(0.0, &mut checklist, &mut resources, &mut agc, &mut panels, &mut workspace, &mut score, &mut logger);
        assert_eq!(queue.pending_count(), 1);
        assert!(queue.history().is_empty());

        queue.update(1.0, &mut checklist, &mut resources, &mut agc, &mut panels, &mut workspace, &mut score, &mut logger);
        assert_eq!(queue.pending_count(), 1);
        assert!(queue.history().is_empty());

        // A side effect outside the manual queue (e.g. a completed event's
        // success effect) refills the tank before the next retry attempt.
        assert!(resources.record_propellant_usage(Tank::LmDescent, -50.0, 2.0, "test_side_effect", &mut logger));

        queue.update(2.0, &mut checklist, &mut resources, &mut agc, &mut panels, &mut workspace, &mut score, &mut logger);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.history()[0].outcome, ManualActionOutcome::Succeeded);
        assert!((resources.state().propellant.lm_descent_kg - 0.0).abs() < 1e-9);
    }
}
