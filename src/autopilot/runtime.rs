use super::command::{AutopilotCommand, AutopilotDefinition};
use super::summary::{AutopilotStatus, AutopilotSummary, BurnDeviations, BurnMetrics};
use crate::logging::MissionLogger;
use crate::panels::AgcState;
use crate::rcs::RcsController;
use crate::resources::ResourceSystem;

#[derive(Debug, Clone, Copy)]
struct ThrottleRamp {
    from: f64,
    to: f64,
    start_get_seconds: f64,
    end_get_seconds: f64,
}

/// Live per-event autopilot runtime (§4.5).
#[derive(Debug, Clone)]
pub struct AutopilotRuntime {
    autopilot_id: String,
    event_id: String,
    start_get_seconds: f64,
    last_update_get_seconds: f64,
    next_command_index: usize,
    current_throttle: f64,
    ramp: Option<ThrottleRamp>,
    ullage_window: Option<(f64, f64)>,
    metrics: BurnMetrics,
    completed: bool,
}

impl AutopilotRuntime {
    fn throttle_at(&self, t: f64) -> f64 {
        match self.ramp {
            None => self.current_throttle,
            Some(r) if t <= r.start_get_seconds => r.from,
            Some(r) if t >= r.end_get_seconds => r.to,
            Some(r) => crate::math::lerp(r.from, r.to, (t - r.start_get_seconds) / (r.end_get_seconds - r.start_get_seconds).max(1e-9)),
        }
    }

    fn integrate_throttle(&self, from_get: f64, to_get: f64) -> f64 {
        let mut breakpoints = vec![from_get, to_get];
        if let Some(r) = self.ramp {
            if r.start_get_seconds > from_get && r.start_get_seconds < to_get {
                breakpoints.push(r.start_get_seconds);
            }
            if r.end_get_seconds > from_get && r.end_get_seconds < to_get {
                breakpoints.push(r.end_get_seconds);
            }
        }
        breakpoints.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut area = 0.0;
        for pair in breakpoints.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            area += (self.throttle_at(a) + self.throttle_at(b)) / 2.0 * (b - a);
        }
        area
    }
}

/// Owns every autopilot definition and the live runtimes started against
/// them.
#[derive(Debug, Clone, Default)]
pub struct AutopilotRunner {
    catalog: std::collections::HashMap<String, AutopilotDefinition>,
    runtimes: std::collections::HashMap<String, AutopilotRuntime>,
}

impl AutopilotRunner {
    #[must_use]
    pub fn new(definitions: Vec<AutopilotDefinition>) -> Self {
        Self { catalog: definitions.into_iter().map(|d| (d.id.clone(), d)).collect(), runtimes: std::collections::HashMap::new() }
    }

    /// Starts a runtime for `event_id` against `autopilot_id`. Returns
    /// `false` when the autopilot id is unknown.
    pub fn start(&mut self, event_id: &str, autopilot_id: &str, get_seconds: f64, logger: &mut MissionLogger) -> bool {
        if !self.catalog.contains_key(autopilot_id) {
            logger.warn(get_seconds, "autopilot", "autopilot_runner", format!("unknown autopilot id {autopilot_id} for event {event_id}"));
            return false;
        }
        self.runtimes.insert(
            event_id.to_string(),
            AutopilotRuntime {
                autopilot_id: autopilot_id.to_string(),
                event_id: event_id.to_string(),
                start_get_seconds: get_seconds,
                last_update_get_seconds: get_seconds,
                next_command_index: 0,
                current_throttle: 0.0,
                ramp: None,
                ullage_window: None,
                metrics: BurnMetrics::default(),
                completed: false,
            },
        );
        logger.note(get_seconds, "autopilot", "autopilot_runner", format!("started {autopilot_id} for event {event_id}"));
        true
    }

    /// Whether a runtime is currently live for `event_id`.
    #[must_use]
    pub fn is_active(&self, event_id: &str) -> bool { self.runtimes.contains_key(event_id) }

    /// Number of autopilot runtimes currently active, for the kernel run
    /// summary.
    #[must_use]
    pub fn active_count(&self) -> usize { self.runtimes.len() }

    /// Advances every live runtime through `get_seconds`, returning the
    /// summaries of any that complete this call.
    pub fn update(
        &mut self,
        resources: &mut ResourceSystem,
        rcs: &mut RcsController,
        agc: &mut AgcState,
        get_seconds: f64,
        logger: &mut MissionLogger,
    ) -> Vec<AutopilotSummary> {
        let mut completed = Vec::new();
        let event_ids: Vec<String> = self.runtimes.keys().cloned().collect();
        for event_id in event_ids {
            if let Some(summary) = self.step(&event_id, resources, rcs, agc, get_seconds, logger) {
                completed.push(summary);
            }
        }
        completed
    }

    fn step(
        &mut self,
        event_id: &str,
        resources: &mut ResourceSystem,
        rcs: &mut RcsController,
        agc: &mut AgcState,
        get_seconds: f64,
        logger: &mut MissionLogger,
    ) -> Option<AutopilotSummary> {
        let def = self.catalog.get(&self.runtimes.get(event_id)?.autopilot_id)?.clone();
        let runtime = self.runtimes.get_mut(event_id)?;
        let elapsed = get_seconds - runtime.start_get_seconds;

        while runtime.next_command_index < def.sequence.len() && def.sequence[runtime.next_command_index].time_seconds <= elapsed + crate::time::EPSILON {
            let cmd = &def.sequence[runtime.next_command_index];
            match &cmd.command {
                AutopilotCommand::AttitudeHold => {}
                AutopilotCommand::UllageFire { duration_seconds } => {
                    runtime.ullage_window = Some((get_seconds, get_seconds + duration_seconds));
                }
                AutopilotCommand::Throttle { level } => {
                    runtime.current_throttle = level.clamp(0.0, 1.0);
                    runtime.ramp = None;
                }
                AutopilotCommand::ThrottleRamp { from, to, duration_seconds } => {
                    let from_level = from.unwrap_or(runtime.current_throttle);
                    if *duration_seconds <= 0.0 {
                        runtime.current_throttle = *to;
                        runtime.ramp = None;
                    } else {
                        runtime.ramp = Some(ThrottleRamp { from: from_level, to: *to, start_get_seconds: get_seconds, end_get_seconds: get_seconds + duration_seconds });
                    }
                }
                AutopilotCommand::RcsPulse(params) => {
                    rcs.fire(params, resources, get_seconds, "autopilot_runner", logger);
                }
                AutopilotCommand::DskyEntry { verb, noun, program, registers } => {
                    agc.record_entry(*verb, *noun, *program, *registers, get_seconds);
                }
            }
            runtime.next_command_index += 1;
        }

        let dt = get_seconds - runtime.last_update_get_seconds;
        if dt > 0.0 {
            let throttle_integral = runtime.integrate_throttle(runtime.last_update_get_seconds, get_seconds);
            if throttle_integral > 0.0 {
                let mass_kg = throttle_integral * def.propulsion.mass_flow_kg_per_sec;
                resources.record_propellant_usage(def.propulsion.tank, mass_kg, get_seconds, "autopilot_runner", logger);
                runtime.metrics.propellant_kg_used += mass_kg;
                runtime.metrics.delta_v_mps += resources.propulsion().consumption_to_delta_v(def.propulsion.tank, mass_kg);
            }
            if let Some((window_start, window_end)) = runtime.ullage_window {
                let overlap_start = window_start.max(runtime.last_update_get_seconds);
                let overlap_end = window_end.min(get_seconds);
                if overlap_end > overlap_start {
                    if let Some(ullage) = &def.propulsion.ullage {
                        let mass_kg = (overlap_end - overlap_start) * ullage.mass_flow_kg_per_sec;
                        resources.record_propellant_usage(ullage.tank, mass_kg, get_seconds, "autopilot_runner", logger);
                    }
                }
                if get_seconds >= window_end {
                    runtime.ullage_window = None;
                }
            }
            runtime.metrics.burn_duration_seconds += dt;
            runtime.last_update_get_seconds = get_seconds;
        }

        let no_pending_commands = runtime.next_command_index >= def.sequence.len();
        let no_pending_ullage = runtime.ullage_window.is_none();
        let throttle_settled = runtime.throttle_at(get_seconds) <= crate::time::EPSILON;
        let duration_elapsed = elapsed >= def.duration_seconds() - crate::time::EPSILON;

        if duration_elapsed && throttle_settled && no_pending_ullage && no_pending_commands && !runtime.completed {
            let deviations = compute_deviations(&def, &runtime.metrics);
            let status = if deviations_within_tolerance(&def, &deviations) { AutopilotStatus::Completed } else { AutopilotStatus::Failed };
            let summary = AutopilotSummary {
                event_id: event_id.to_string(),
                autopilot_id: def.id.clone(),
                metrics: runtime.metrics,
                deviations,
                direction: def.direction,
                status,
                completed_at_seconds: get_seconds,
            };
            logger.note(get_seconds, "autopilot", "autopilot_runner", format!("{event_id} ({}) {status}", def.id));
            self.runtimes.remove(event_id);
            return Some(summary);
        }
        None
    }

    /// Forces `event_id`'s runtime to process through `get_seconds` and
    /// complete, regardless of whether the natural completion gate has been
    /// reached (§4.5: `finish`).
    pub fn finish(
        &mut self,
        event_id: &str,
        resources: &mut ResourceSystem,
        rcs: &mut RcsController,
        agc: &mut AgcState,
        get_seconds: f64,
        logger: &mut MissionLogger,
    ) -> Option<AutopilotSummary> {
        if let Some(runtime) = self.runtimes.get_mut(event_id) {
            runtime.current_throttle = 0.0;
            runtime.ramp = None;
        }
        self.step(event_id, resources, rcs, agc, get_seconds, logger)
    }

    /// Aborts `event_id`'s runtime without producing a completion summary
    /// (§4.5).
    pub fn abort(&mut self, event_id: &str, get_seconds: f64, reason: &str, logger: &mut MissionLogger) {
        if self.runtimes.remove(event_id).is_some() {
            logger.warn(get_seconds, "autopilot", "autopilot_runner", format!("aborted {event_id}: {reason}"));
        }
    }
}

fn compute_deviations(def: &AutopilotDefinition, metrics: &BurnMetrics) -> BurnDeviations {
    BurnDeviations {
        burn_duration_seconds: def.tolerances.burn_duration_seconds.map(|_| metrics.burn_duration_seconds),
        propellant_kg: def.tolerances.propellant_kg.map(|_| metrics.propellant_kg_used),
        delta_v_mps: def.tolerances.delta_v_mps.map(|_| metrics.delta_v_mps),
    }
}

fn deviations_within_tolerance(def: &AutopilotDefinition, deviations: &BurnDeviations) -> bool {
    let duration_ok = match (def.tolerances.burn_duration_seconds, deviations.burn_duration_seconds) {
        (Some(range), Some(value)) => range.contains(value),
        _ => true,
    };
    let propellant_ok = match (def.tolerances.propellant_kg, deviations.propellant_kg) {
        (Some(range), Some(value)) => range.contains(value),
        _ => true,
    };
    let delta_v_ok = match (def.tolerances.delta_v_mps, deviations.delta_v_mps) {
        (Some(range), Some(value)) => range.contains(value),
        _ => true,
    };
    duration_ok && propellant_ok && delta_v_ok
}
