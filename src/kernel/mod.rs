//! The Simulation Kernel (C12): the fixed-rate tick engine that binds every
//! other component into a single deterministic pipeline (§4.1 of the
//! design spec).

mod config;
mod frame;
mod summary;

pub use config::KernelConfig;
pub use frame::Frame;
pub use summary::{AudioStats, AutopilotStats, ChecklistStats, EventsSummary, ManualActionStats, RcsStats, Summary};

use crate::audio::{AudioCatalog, AudioCueBinder, AudioDispatcher};
use crate::autopilot::{AutopilotDefinition, AutopilotRunner};
use crate::checklist::{ChecklistDefinition, ChecklistManager};
use crate::logging::MissionLogger;
use crate::manual::ManualActionQueue;
use crate::math::Vec3D;
use crate::orbit::{BurnFrame, DeltaVAim, OrbitPropagator};
use crate::panels::{AgcState, PanelState, Workspace};
use crate::rcs::RcsController;
use crate::resources::ResourceSystem;
use crate::scheduler::{EventDefinition, EventScheduler};
use crate::score::{ScoreConfig, ScoreSystem};
use crate::time::SimulationClock;
use std::fmt;

/// The mission's static data, assembled by the (out-of-scope) loader and
/// handed to the kernel at construction.
pub struct MissionData {
    pub events: Vec<EventDefinition>,
    pub autopilots: Vec<AutopilotDefinition>,
    pub checklists: Vec<ChecklistDefinition>,
    pub rcs: RcsController,
    pub resources: ResourceSystem,
    pub orbit: OrbitPropagator,
    pub audio_catalog: AudioCatalog,
    pub score_config: ScoreConfig,
    pub known_panels: Vec<String>,
}

/// Raised by the async run variant when `shouldAbort()` signals a halt
/// (§4.1). Carries the summary constructed from state as of the tick the
/// abort was observed, so callers still receive partial metrics.
#[derive(Debug)]
pub struct KernelAborted(pub Box<Summary>);

impl fmt::Display for KernelAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kernel aborted at GET {:.3}s ({} ticks)", self.0.final_get_seconds, self.0.ticks)
    }
}

impl std::error::Error for KernelAborted {}

/// The live kernel: every subsystem plus the clock and mission logger that
/// binds them (§4.1).
pub struct Kernel {
    config: KernelConfig,
    clock: SimulationClock,
    logger: MissionLogger,
    scheduler: EventScheduler,
    checklist: ChecklistManager,
    autopilot: AutopilotRunner,
    rcs: RcsController,
    resources: ResourceSystem,
    orbit: OrbitPropagator,
    manual_actions: ManualActionQueue,
    audio_binder: AudioCueBinder,
    audio_dispatcher: AudioDispatcher,
    score: ScoreSystem,
    panels: PanelState,
    workspace: Workspace,
    agc: AgcState,
    autopilot_stats: AutopilotStats,
    time_since_last_frame_seconds: f64,
}

impl Kernel {
    /// Builds a kernel from mission data and configuration. The checklist
    /// timing and auto-advance default come from `config`; the event
    /// scheduler resolves autopilot/checklist cross-references and computes
    /// expected durations at this point.
    #[must_use]
    pub fn new(config: KernelConfig, data: MissionData) -> Self {
        let mut logger = MissionLogger::new();
        let checklist_timing = config.checklist_timing();
        let scheduler = EventScheduler::new(data.events, &data.autopilots, &data.checklists, checklist_timing, config.auto_advance_checklists, &mut logger);
        Self {
            config,
            clock: SimulationClock::new(config.tick_rate_hz),
            logger,
            scheduler,
            checklist: ChecklistManager::new(data.checklists),
            autopilot: AutopilotRunner::new(data.autopilots),
            rcs: data.rcs,
            resources: data.resources,
            orbit: data.orbit,
            manual_actions: ManualActionQueue::new(),
            audio_binder: AudioCueBinder::new(),
            audio_dispatcher: AudioDispatcher::new(data.audio_catalog),
            score: ScoreSystem::new(data.score_config),
            panels: PanelState::default(),
            workspace: Workspace::new(data.known_panels),
            agc: AgcState::default(),
            autopilot_stats: AutopilotStats::default(),
            time_since_last_frame_seconds: 0.0,
        }
    }

    /// Enqueues a manual action against the live queue, see
    /// [`ManualActionQueue::enqueue`].
    pub fn enqueue_manual_action(
        &mut self,
        kind: crate::manual::ManualActionKind,
        get_seconds: f64,
        retry_until_seconds: Option<f64>,
        retry_interval_seconds: Option<f64>,
    ) {
        self.manual_actions.enqueue(kind, get_seconds, retry_until_seconds, retry_interval_seconds);
    }

    /// Read-only access to the mission logger's ledger.
    #[must_use]
    pub fn logger(&self) -> &MissionLogger { &self.logger }

    /// Current Ground Elapsed Time, in seconds.
    #[must_use]
    pub fn get_seconds(&self) -> f64 { self.clock.get_seconds() }

    /// Advances the kernel by exactly one tick, in the strict order of §2:
    /// manual queue, scheduler (events, checklist updates, autopilot
    /// start/finish), orbit propagator, resource system, score system,
    /// audio dispatcher, HUD build callback, then clock advance.
    pub fn process_tick(&mut self, on_frame: Option<&mut dyn FnMut(Frame)>) {
        let get_seconds = self.clock.get_seconds();
        let dt_seconds = self.clock.dt_seconds();

        self.manual_actions.update(get_seconds, &mut self.checklist, &mut self.resources, &mut self.agc, &mut self.panels, &mut self.workspace, &mut self.score, &mut self.logger);

        let summaries = self.scheduler.update(
            get_seconds,
            &mut self.checklist,
            &mut self.autopilot,
            &mut self.resources,
            &mut self.rcs,
            &mut self.agc,
            &mut self.audio_binder,
            &mut self.score,
            &mut self.logger,
        );
        for summary in &summaries {
            self.autopilot_stats.record(summary.status);
            if summary.metrics.delta_v_mps.abs() > crate::time::EPSILON {
                self.orbit.apply_delta_v(
                    summary.metrics.delta_v_mps,
                    DeltaVAim::Frame(summary.direction),
                    get_seconds,
                    Some(format!("autopilot:{}", summary.autopilot_id)),
                    &mut self.logger,
                );
            }
        }

        self.orbit.update(dt_seconds, get_seconds, Vec3D::ZERO);
        self.resources.update(dt_seconds, get_seconds, &mut self.audio_binder, &mut self.logger);
        self.score.update(dt_seconds, get_seconds, &self.resources.snapshot(), &mut self.logger);

        let pending_audio = self.audio_binder.drain();
        self.audio_dispatcher.tick(get_seconds, pending_audio, &mut self.logger);

        self.time_since_last_frame_seconds += dt_seconds;
        if let Some(on_frame) = on_frame {
            if self.time_since_last_frame_seconds + crate::time::EPSILON >= self.config.frame_cadence_seconds {
                self.time_since_last_frame_seconds = 0.0;
                on_frame(self.frame());
            }
        }

        self.clock.advance();
    }

    /// Builds the current telemetry frame (§6), independent of the
    /// end-of-run summary.
    #[must_use]
    pub fn frame(&self) -> Frame {
        Frame {
            get_seconds: self.clock.get_seconds(),
            event_counts: self.scheduler.counts(),
            resources: self.resources.snapshot(),
            orbit_state: self.orbit.state(),
            orbit_elements: self.orbit.summary().elements,
            panels: self.panels.clone(),
            agc: self.agc,
            score: self.score.summary(),
        }
    }

    /// The final run summary (§6), safe to call at any point — not only at
    /// the end of a run — since every field is a pure function of current
    /// state.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let (succeeded, expired) = summary::count_outcomes(self.manual_actions.history());
        Summary {
            ticks: self.clock.tick_count(),
            final_get_seconds: self.clock.get_seconds(),
            events: EventsSummary { counts: self.scheduler.counts(), upcoming: self.scheduler.upcoming() },
            resources: self.resources.snapshot(),
            checklists: ChecklistStats { active_checklists: self.checklist.active_count() },
            manual_actions: ManualActionStats { pending: self.manual_actions.pending_count(), succeeded, expired },
            autopilot: AutopilotStats { active: self.autopilot.active_count(), ..self.autopilot_stats },
            rcs: RcsStats { total_pulses: self.rcs.total_pulses(), total_impulse_ns: self.rcs.total_impulse_ns() },
            orbit: self.orbit.summary(),
            audio: AudioStats { suppressed_triggers: self.audio_dispatcher.suppressed_count(), ledger_entries: self.audio_dispatcher.ledger().len() },
            score: self.score.summary(),
        }
    }

    /// Runs synchronously until `current_get_seconds >= until_get_seconds`,
    /// or until `on_tick` returns `false` (§4.1). `on_tick` is invoked after
    /// every completed tick with the kernel's current GET.
    pub fn run(&mut self, until_get_seconds: f64, mut on_tick: Option<&mut dyn FnMut(f64) -> bool>) -> Summary {
        while self.clock.get_seconds() + crate::time::EPSILON < until_get_seconds {
            self.process_tick(None);
            if let Some(callback) = on_tick.as_mut() {
                if !callback(self.clock.get_seconds()) {
                    break;
                }
            }
        }
        self.summary()
    }

    /// The async run variant (§4.1, §5, §7): identical tick ordering and
    /// timestep, but yields cooperatively between ticks so an external
    /// pacer can throttle emission, and observes `should_abort` between
    /// ticks. Returns `Err(KernelAborted)` carrying the partial summary if
    /// `should_abort` ever returns true before the run completes.
    pub async fn run_async(
        &mut self,
        until_get_seconds: f64,
        mut should_abort: impl FnMut() -> bool,
    ) -> Result<Summary, KernelAborted> {
        while self.clock.get_seconds() + crate::time::EPSILON < until_get_seconds {
            if should_abort() {
                return Err(KernelAborted(Box::new(self.summary())));
            }
            self.process_tick(None);
            tokio::task::yield_now().await;
        }
        Ok(self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{PropulsionBudget, ResourceState};

    fn empty_kernel() -> Kernel {
        let data = MissionData {
            events: vec![],
            autopilots: vec![],
            checklists: vec![],
            rcs: RcsController::new(vec![], 0.01),
            resources: ResourceSystem::new(ResourceState::nominal(), PropulsionBudget::default(), vec![]),
            orbit: OrbitPropagator::new(
                crate::orbit::PrimaryBody::earth(),
                crate::orbit::StateVector { position_m: Vec3D::new(6_778_137.0, 0.0, 0.0), velocity_mps: Vec3D::new(0.0, 7668.0, 0.0) },
                0.0,
            ),
            audio_catalog: AudioCatalog::default(),
            score_config: ScoreConfig::default(),
            known_panels: vec![],
        };
        Kernel::new(KernelConfig::default(), data)
    }

    #[test]
    fn empty_mission_reaches_target_get_with_full_event_and_fault_score() {
        let mut kernel = empty_kernel();
        kernel.logger.set_echo_to_console(false);
        let summary = kernel.run(0.5, None);
        assert_eq!(summary.ticks, 10);
        assert!((summary.final_get_seconds - 0.5).abs() < 1e-9);
        assert_eq!(summary.events.counts.pending, 0);
        // No events and no faults yield perfect event/fault scores, but an
        // empty propulsion budget leaves delta-v margin at 0, the bottom of
        // its ramp, so the resource term (and commander score) stay short of
        // perfect: 100 * (0.5*1 + 0.3*(0.5*1 + 0.4*0 + 0.1*1) + 0.2*1) = 88.
        assert!((summary.score.event_score - 1.0).abs() < 1e-9);
        assert!((summary.score.fault_score - 1.0).abs() < 1e-9);
        assert!((summary.score.commander_score - 88.0).abs() < 1e-6);
        assert_eq!(summary.score.grade, crate::score::Grade::B);
    }

    #[test]
    fn single_timer_event_completes_and_applies_success_effect() {
        let mut effect = crate::resources::EffectMap::new();
        effect.insert("power_margin_pct".to_string(), crate::resources::EffectValue::Number(-5.0));
        let events = vec![EventDefinition {
            id: "E1".to_string(),
            get_open_seconds: 0.0,
            get_close_seconds: 10.0,
            prerequisites: vec![],
            autopilot_id: None,
            checklist_id: None,
            success_effects: effect,
            failure_effects: crate::resources::EffectMap::new(),
            audio_cue_id: None,
            is_comms: false,
        }];
        let data = MissionData {
            events,
            autopilots: vec![],
            checklists: vec![],
            rcs: RcsController::new(vec![], 0.01),
            resources: ResourceSystem::new(ResourceState::nominal(), PropulsionBudget::default(), vec![]),
            orbit: OrbitPropagator::new(
                crate::orbit::PrimaryBody::earth(),
                crate::orbit::StateVector { position_m: Vec3D::new(6_778_137.0, 0.0, 0.0), velocity_mps: Vec3D::new(0.0, 7668.0, 0.0) },
                0.0,
            ),
            audio_catalog: AudioCatalog::default(),
            score_config: ScoreConfig::default(),
            known_panels: vec![],
        };
        let mut kernel = Kernel::new(KernelConfig::default(), data);
        kernel.logger.set_echo_to_console(false);
        let before_power = kernel.resources.state().power_margin_pct;
        let summary = kernel.run(15.0, None);
        assert_eq!(summary.events.counts.complete, 1);
        assert!((kernel.resources.state().power_margin_pct - (before_power - 5.0)).abs() < 1e-9);
    }

    #[test]
    fn autopilot_burn_consumes_propellant_proportional_to_throttle_time() {
        use crate::autopilot::{AutopilotCommand, AutopilotDefinition, PropulsionProfile, ScriptCommand, Tolerances};
        use crate::orbit::BurnFrame;
        use crate::resources::{PropulsionStage, Tank};

        let autopilot = AutopilotDefinition {
            id: "AP1".to_string(),
            description: "test burn".to_string(),
            sequence: vec![
                ScriptCommand { time_seconds: 0.0, command: AutopilotCommand::Throttle { level: 1.0 } },
                ScriptCommand { time_seconds: 5.0, command: AutopilotCommand::Throttle { level: 0.0 } },
            ],
            tolerances: Tolerances::default(),
            propulsion: PropulsionProfile { tank: Tank::CsmSps, mass_flow_kg_per_sec: 10.0, ullage: None },
            direction: BurnFrame::Prograde,
        };
        let events = vec![EventDefinition {
            id: "E2".to_string(),
            get_open_seconds: 0.0,
            get_close_seconds: 60.0,
            prerequisites: vec![],
            autopilot_id: Some("AP1".to_string()),
            checklist_id: None,
            success_effects: crate::resources::EffectMap::new(),
            failure_effects: crate::resources::EffectMap::new(),
            audio_cue_id: None,
            is_comms: false,
        }];
        let mut state = ResourceState::nominal();
        state.propellant.csm_sps_kg = 100.0;
        let mut propulsion = PropulsionBudget::default();
        propulsion.set_stage(Tank::CsmSps, PropulsionStage { initial_kg: 100.0, reserve_kg: 0.0, usable_delta_v_mps: 2000.0, remaining_kg: 100.0, adjustment_mps: 0.0 });
        let data = MissionData {
            events,
            autopilots: vec![autopilot],
            checklists: vec![],
            rcs: RcsController::new(vec![], 0.01),
            resources: ResourceSystem::new(state, propulsion, vec![]),
            orbit: OrbitPropagator::new(
                crate::orbit::PrimaryBody::earth(),
                crate::orbit::StateVector { position_m: Vec3D::new(6_778_137.0, 0.0, 0.0), velocity_mps: Vec3D::new(0.0, 7668.0, 0.0) },
                0.0,
            ),
            audio_catalog: AudioCatalog::default(),
            score_config: ScoreConfig::default(),
            known_panels: vec![],
        };
        let mut kernel = Kernel::new(KernelConfig::default(), data);
        kernel.logger.set_echo_to_console(false);
        kernel.run(10.0, None);

        let remaining = kernel.resources.state().propellant.csm_sps_kg;
        assert!((100.0 - remaining - 50.0).abs() < 0.1, "expected ~50kg consumed, {} remaining", remaining);
        assert_eq!(kernel.scheduler.counts().complete, 1);
        assert!(kernel.resources.propulsion().stage("csm_sps").unwrap().margin_mps() < 2000.0);
    }

    #[test]
    fn unsatisfied_prerequisite_keeps_dependent_event_from_ever_arming() {
        // A 3s window forces `expected_duration_seconds` (half-window
        // clamped to [5, 600] -> 5s) above the window itself, so E3 can
        // never satisfy its timer gate before its own window closes.
        let e3 = EventDefinition {
            id: "E3".to_string(),
            get_open_seconds: 0.0,
            get_close_seconds: 3.0,
            prerequisites: vec![],
            autopilot_id: None,
            checklist_id: None,
            success_effects: crate::resources::EffectMap::new(),
            failure_effects: crate::resources::EffectMap::new(),
            audio_cue_id: None,
            is_comms: false,
        };
        let e4 = EventDefinition {
            id: "E4".to_string(),
            get_open_seconds: 0.0,
            get_close_seconds: 3.0,
            prerequisites: vec!["E3".to_string()],
            autopilot_id: None,
            checklist_id: None,
            success_effects: crate::resources::EffectMap::new(),
            failure_effects: crate::resources::EffectMap::new(),
            audio_cue_id: None,
            is_comms: false,
        };
        let data = MissionData {
            events: vec![e3, e4],
            autopilots: vec![],
            checklists: vec![],
            rcs: RcsController::new(vec![], 0.01),
            resources: ResourceSystem::new(ResourceState::nominal(), PropulsionBudget::default(), vec![]),
            orbit: OrbitPropagator::new(
                crate::orbit::PrimaryBody::earth(),
                crate::orbit::StateVector { position_m: Vec3D::new(6_778_137.0, 0.0, 0.0), velocity_mps: Vec3D::new(0.0, 7668.0, 0.0) },
                0.0,
            ),
            audio_catalog: AudioCatalog::default(),
            score_config: ScoreConfig::default(),
            known_panels: vec![],
        };
        let mut kernel = Kernel::new(KernelConfig::default(), data);
        kernel.logger.set_echo_to_console(false);
        let summary = kernel.run(6.0, None);
        assert_eq!(summary.events.counts.failed, 2);
        assert_eq!(summary.events.counts.complete, 0);
        assert_eq!(summary.events.counts.armed, 0);
    }
}
