//! The Resource System (C3): consumables state, effect application, and
//! derived metrics (power, propellant, life support, communications).
//!
//! This is the largest subsystem in the kernel and the one every other
//! component ultimately reports into: autopilots and RCS record propellant
//! burns here, the scheduler applies event effects here, and the score
//! system reads snapshots of it. Per the concurrency model (§5 of the
//! design spec) there is exactly one [`ResourceSystem`] per kernel and every
//! mutation goes through its public methods — no internal locking, because
//! there is no concurrency.

mod communications;
mod effect;
mod propulsion;
mod state;

pub use communications::{CommsPass, CommunicationsState};
pub use effect::{EffectMap, EffectValue};
pub use propulsion::{DeltaVMetrics, PropulsionBudget, PropulsionStage};
pub use state::{LifeSupportState, PowerState, ResourceState};

use crate::logging::MissionLogger;

/// The source of an effect application, recorded for audit/logging and used
/// by the score system to tally manual-vs-automatic activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EffectOrigin {
    Success,
    Failure,
    Manual,
}

/// Known propellant tanks. A recognised, closed set rather than a free
/// string key, so `record_propellant_usage` can return `false` on typos
/// instead of silently creating new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Tank {
    CsmSps,
    CsmRcs,
    LmDescent,
    LmAscent,
    LmRcs,
}

impl Tank {
    /// Parses the wire key used in mission data / effect maps
    /// (`csm_sps_kg` etc. minus the `_kg` suffix, or the bare tank key).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "csm_sps" | "csm_sps_kg" => Some(Tank::CsmSps),
            "csm_rcs" | "csm_rcs_kg" => Some(Tank::CsmRcs),
            "lm_descent" | "lm_descent_kg" => Some(Tank::LmDescent),
            "lm_ascent" | "lm_ascent_kg" => Some(Tank::LmAscent),
            "lm_rcs" | "lm_rcs_kg" => Some(Tank::LmRcs),
            _ => None,
        }
    }

    /// The propulsion stage this tank draws from a delta-v budget
    /// perspective. RCS tanks do not back a delta-v stage in this model.
    #[must_use]
    pub fn stage(self) -> Option<Self> {
        match self {
            Tank::CsmSps | Tank::LmDescent | Tank::LmAscent => Some(self),
            Tank::CsmRcs | Tank::LmRcs => None,
        }
    }
}

/// Configuration for passive drift/recovery rates used by `update`.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct DriftConfig {
    pub cryo_boiloff_drift_pct_per_hr: f64,
    pub cryo_boiloff_recovery_pct_per_hr: f64,
    pub cryo_boiloff_min: f64,
    pub cryo_boiloff_max: f64,
    pub battery_drift_pct_per_hr: f64,
    pub battery_recovery_pct_per_hr: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            cryo_boiloff_drift_pct_per_hr: 1.5,
            cryo_boiloff_recovery_pct_per_hr: -0.75,
            cryo_boiloff_min: 0.5,
            cryo_boiloff_max: 5.0,
            battery_drift_pct_per_hr: -0.4,
            battery_recovery_pct_per_hr: 0.2,
        }
    }
}

/// The live resource system: state, propulsion budgets, derived metrics,
/// failure set, and the communications schedule/state machine.
#[derive(Debug, Clone)]
pub struct ResourceSystem {
    state: ResourceState,
    propulsion: PropulsionBudget,
    delta_v_metrics: DeltaVMetrics,
    failures: std::collections::BTreeSet<String>,
    drift: DriftConfig,
    comms: CommunicationsState,
}

impl ResourceSystem {
    /// Creates a resource system from an initial state, propulsion budget,
    /// and communications pass schedule.
    #[must_use]
    pub fn new(state: ResourceState, propulsion: PropulsionBudget, comms_schedule: Vec<CommsPass>) -> Self {
        Self {
            state,
            propulsion,
            delta_v_metrics: DeltaVMetrics::default(),
            failures: std::collections::BTreeSet::new(),
            drift: DriftConfig::default(),
            comms: CommunicationsState::new(comms_schedule),
        }
    }

    /// Overrides the default passive drift configuration.
    pub fn set_drift_config(&mut self, drift: DriftConfig) { self.drift = drift; }

    /// Read-only access to the live state.
    #[must_use]
    pub fn state(&self) -> &ResourceState { &self.state }

    /// Read-only access to the propulsion budget.
    #[must_use]
    pub fn propulsion(&self) -> &PropulsionBudget { &self.propulsion }

    /// Read-only access to accumulated delta-v metrics.
    #[must_use]
    pub fn delta_v_metrics(&self) -> &DeltaVMetrics { &self.delta_v_metrics }

    /// Read-only access to the failure id set.
    #[must_use]
    pub fn failures(&self) -> &std::collections::BTreeSet<String> { &self.failures }

    /// A deep copy of the live resource state, for downstream consumers
    /// (score system, frame/summary payloads).
    #[must_use]
    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            state: self.state.clone(),
            propulsion: self.propulsion.clone(),
            delta_v_metrics: self.delta_v_metrics,
            failures: self.failures.iter().cloned().collect(),
        }
    }

    /// Applies a nested effect map: numeric leaves accumulate, non-numeric
    /// leaves replace. See [`effect::apply_effect_map`] for the recursion.
    pub fn apply_effect(
        &mut self,
        effect: &EffectMap,
        get_seconds: f64,
        source: &str,
        origin: EffectOrigin,
        logger: &mut MissionLogger,
    ) {
        effect::apply_effect_map(&mut self.state, effect, &mut self.failures);
        self.recompute_after_effect(effect);
        logger.note(
            get_seconds,
            "resources",
            source,
            format!("applied {origin} effect ({} top-level field(s))", effect.len()),
        );
    }

    /// Records propellant consumption (positive `amount_kg`) or replenishment
    /// (negative `amount_kg`) against `tank`. Returns `false` (and logs a
    /// warning) when the tank key is unrecognised or the request would drive
    /// the tank negative.
    pub fn record_propellant_usage(
        &mut self,
        tank: Tank,
        amount_kg: f64,
        get_seconds: f64,
        source: &str,
        logger: &mut MissionLogger,
    ) -> bool {
        let current = self.state.propellant.get(tank);
        let next = current - amount_kg;
        if next < -1e-9 {
            logger.warn(
                get_seconds,
                "resources",
                source,
                format!("refusing propellant usage on {tank}: {current:.3}kg - {amount_kg:.3}kg would go negative"),
            );
            return false;
        }
        self.state.propellant.set(tank, next.max(0.0));
        if amount_kg > 0.0 {
            self.delta_v_metrics.used_mps += self.propulsion.consumption_to_delta_v(tank, amount_kg);
        } else if amount_kg < 0.0 {
            self.delta_v_metrics.recovered_mps += self.propulsion.consumption_to_delta_v(tank, -amount_kg);
        }
        self.recompute_stage_margin(tank);
        logger.note(
            get_seconds,
            "resources",
            source,
            format!("{tank}: {amount_kg:+.3}kg ({current:.3} -> {:.3})", self.state.propellant.get(tank)),
        );
        true
    }

    /// Records an additive delta to a named power-load metric
    /// (`fuel_cell_load_kw`, or a named consumer in `power.loads`).
    /// Returns `false` when the metric key is unrecognised.
    pub fn record_power_load_delta(
        &mut self,
        metric_key: &str,
        delta_kw: f64,
        get_seconds: f64,
        source: &str,
        logger: &mut MissionLogger,
    ) -> bool {
        let applied = match metric_key {
            "fuel_cell_load_kw" => {
                self.state.power.fuel_cell_load_kw += delta_kw;
                true
            }
            "fuel_cell_output_kw" => {
                self.state.power.fuel_cell_output_kw += delta_kw;
                true
            }
            other => {
                if let Some(v) = self.state.power.loads.get_mut(other) {
                    *v += delta_kw;
                    true
                } else {
                    self.state.power.loads.insert(other.to_string(), delta_kw);
                    true
                }
            }
        };
        if applied {
            self.recompute_power_margin();
            logger.note(get_seconds, "resources", source, format!("power load {metric_key} {delta_kw:+.3}kW"));
        } else {
            logger.warn(get_seconds, "resources", source, format!("unknown power metric key {metric_key}"));
        }
        applied
    }

    /// Advances passive drift/recovery and the communications state machine
    /// by `dt_seconds`.
    pub fn update(&mut self, dt_seconds: f64, get_seconds: f64, audio: &mut crate::audio::AudioCueBinder, logger: &mut MissionLogger) {
        let dt_hr = dt_seconds / 3600.0;
        let cryo_rate = if self.state.ptc_active {
            self.drift.cryo_boiloff_recovery_pct_per_hr
        } else {
            self.drift.cryo_boiloff_drift_pct_per_hr
        };
        self.state.cryo_boiloff_rate_pct_per_hr = crate::math::clamp(
            self.state.cryo_boiloff_rate_pct_per_hr + cryo_rate * dt_hr,
            self.drift.cryo_boiloff_min,
            self.drift.cryo_boiloff_max,
        );
        let batt_rate = if self.state.ptc_active {
            self.drift.battery_recovery_pct_per_hr
        } else {
            self.drift.battery_drift_pct_per_hr
        };
        self.state.power.battery_charge_pct = crate::math::clamp(
            self.state.power.battery_charge_pct + batt_rate * dt_hr,
            0.0,
            100.0,
        );
        self.comms.update(get_seconds, &mut self.state, audio, logger);
    }

    /// Re-derives fields whose inputs an effect touched. Deliberately scoped
    /// to the submaps an effect actually carries: a direct scalar leaf on
    /// `power_margin_pct` / `delta_v_margin_mps` (applied by
    /// `apply_effect_map` before this runs) is a bookkeeping adjustment, not
    /// a recomputation input, so it must survive this call rather than be
    /// overwritten by a formula unrelated to it.
    fn recompute_after_effect(&mut self, effect: &EffectMap) {
        if effect.contains_key("propellant") {
            for tank in [Tank::CsmSps, Tank::CsmRcs, Tank::LmDescent, Tank::LmAscent, Tank::LmRcs] {
                self.recompute_stage_margin(tank);
            }
        }
        if let Some(EffectValue::SubMap(dv)) = effect.get("delta_v") {
            if let Some(EffectValue::SubMap(stages)) = dv.get("stages") {
                for (stage_key, stage_val) in stages {
                    if let EffectValue::SubMap(stage_fields) = stage_val {
                        if let Some(EffectValue::Number(adjustment)) = stage_fields.get("adjustment_mps") {
                            self.propulsion.add_stage_adjustment(stage_key, *adjustment);
                        }
                    }
                }
            }
            self.state.delta_v_margin_mps = self.propulsion.total_margin();
        }
        if effect.contains_key("power") {
            self.recompute_power_margin();
        }
    }

    fn recompute_stage_margin(&mut self, tank: Tank) {
        if tank.stage().is_some() {
            self.propulsion.set_remaining(tank, self.state.propellant.get(tank));
            self.state.delta_v_margin_mps = self.propulsion.total_margin();
        }
    }

    fn recompute_power_margin(&mut self) {
        let output = self.state.power.fuel_cell_output_kw;
        let load = self.state.power.fuel_cell_load_kw + self.state.power.loads.values().sum::<f64>();
        let margin_pct = if output.abs() < 1e-9 {
            0.0
        } else {
            crate::math::clamp(((output - load) / output) * 100.0, 0.0, 100.0)
        };
        self.state.power_margin_pct = margin_pct;
    }

    /// Read-only access to the communications schedule/state machine.
    #[must_use]
    pub fn communications(&self) -> &CommunicationsState { &self.comms }
}

/// A deep snapshot of the resource system, safe to retain past the tick
/// that produced it (unlike `&ResourceState`, which borrows the live
/// system).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResourceSnapshot {
    pub state: ResourceState,
    pub propulsion: PropulsionBudget,
    pub delta_v_metrics: DeltaVMetrics,
    pub failures: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> ResourceSystem {
        let state = ResourceState::nominal();
        let mut propulsion = PropulsionBudget::default();
        propulsion.set_stage(Tank::CsmSps, PropulsionStage { initial_kg: 100.0, reserve_kg: 10.0, usable_delta_v_mps: 500.0, remaining_kg: 100.0, adjustment_mps: 0.0 });
        ResourceSystem::new(state, propulsion, vec![])
    }

    #[test]
    fn propellant_usage_clamps_at_zero_and_refuses_overdraw() {
        let mut sys = system();
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        assert!(sys.record_propellant_usage(Tank::CsmSps, 95.0, 0.0, "test", &mut logger));
        assert!((sys.state().propellant.get(Tank::CsmSps) - 5.0).abs() < 1e-9);
        assert!(!sys.record_propellant_usage(Tank::CsmSps, 10.0, 1.0, "test", &mut logger));
        assert!(sys.state().propellant.get(Tank::CsmSps) >= 0.0);
    }

    #[test]
    fn stage_delta_v_margin_matches_closed_form() {
        let mut sys = system();
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        sys.record_propellant_usage(Tank::CsmSps, 30.0, 0.0, "test", &mut logger);
        let remaining = 70.0_f64;
        let expected = 500.0_f64 * ((remaining - 10.0) / (100.0 - 10.0)).clamp(0.0, 1.0);
        assert!((sys.state().delta_v_margin_mps - expected).abs() < 1e-6);
    }

    #[test]
    fn unknown_power_metric_still_recorded_but_margin_updates() {
        let mut sys = system();
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        sys.state.power.fuel_cell_output_kw = 10.0;
        sys.state.power.fuel_cell_load_kw = 2.0;
        sys.record_power_load_delta("fuel_cell_load_kw", 3.0, 0.0, "test", &mut logger);
        assert!((sys.state().power_margin_pct - 50.0).abs() < 1e-6);
    }
}
