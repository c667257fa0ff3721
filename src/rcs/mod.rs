//! The RCS Controller (C6): thruster pulse selection and propellant
//! accounting (§4.6 of the design spec).

mod thruster;

pub use thruster::{Thruster, TorqueAxis, TranslationAxis};

use crate::logging::MissionLogger;
use crate::resources::{ResourceSystem, Tank};

/// Standard gravity, used to convert specific impulse into mass flow.
pub const G0_MPS2: f64 = 9.80665;

/// Parameters for one RCS pulse request, as issued by an autopilot
/// `rcs_pulse` command or a manual action.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PulseParams {
    pub craft_id: Option<String>,
    pub thruster_ids: Option<Vec<String>>,
    pub axis: Option<TranslationAxis>,
    pub torque_axis: Option<TorqueAxis>,
    pub duration_seconds: Option<f64>,
    pub count: Option<u32>,
    pub duty_cycle: f64,
    pub tank_key: Option<String>,
    pub max_thrusters: Option<usize>,
}

/// Accumulated metrics for a resolved pulse.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct PulseMetrics {
    pub thrusters_fired: usize,
    pub total_impulse_ns: f64,
    pub propellant_kg: f64,
}

/// The RCS thruster catalog and pulse executor.
#[derive(Debug, Clone, Default)]
pub struct RcsController {
    thrusters: Vec<Thruster>,
    min_impulse_seconds: f64,
    total_pulses: u64,
    total_impulse_ns: f64,
}

impl RcsController {
    #[must_use]
    pub fn new(thrusters: Vec<Thruster>, min_impulse_seconds: f64) -> Self {
        Self { thrusters, min_impulse_seconds, total_pulses: 0, total_impulse_ns: 0.0 }
    }

    /// Selects thrusters matching `params` (§4.6): explicit ids override,
    /// otherwise intersect the translation/torque axis sets, optionally
    /// restricted to a craft, sorted by id, truncated to `max_thrusters`.
    fn select<'a>(&'a self, params: &PulseParams) -> Vec<&'a Thruster> {
        let mut selected: Vec<&Thruster> = if let Some(ids) = &params.thruster_ids {
            self.thrusters.iter().filter(|t| ids.contains(&t.id)).collect()
        } else {
            self.thrusters
                .iter()
                .filter(|t| params.axis.is_none_or(|a| t.translation_axes.contains(&a)))
                .filter(|t| params.torque_axis.is_none_or(|a| t.torque_axes.contains(&a)))
                .collect()
        };
        if let Some(craft) = &params.craft_id {
            selected.retain(|t| &t.craft_id == craft);
        }
        selected.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(max) = params.max_thrusters {
            selected.truncate(max);
        }
        selected
    }

    /// Executes a resolved pulse against `resources`, consuming propellant
    /// from the resolved tank and accumulating impulse/propellant metrics.
    pub fn fire(
        &mut self,
        params: &PulseParams,
        resources: &mut ResourceSystem,
        get_seconds: f64,
        source: &str,
        logger: &mut MissionLogger,
    ) -> PulseMetrics {
        let selected: Vec<Thruster> = self.select(params).into_iter().cloned().collect();
        if selected.is_empty() {
            logger.warn(get_seconds, "rcs", source, "no thrusters matched pulse selection".to_string());
            return PulseMetrics::default();
        }
        let duration = params.duration_seconds.unwrap_or(0.02).max(self.min_impulse_seconds);
        let effective_duration = duration * params.duty_cycle.clamp(0.0, 1.0);
        let count = params.count.unwrap_or(1).max(1) as f64;
        let tank = params
            .tank_key
            .as_deref()
            .and_then(Tank::from_key)
            .unwrap_or_else(|| selected[0].tank);

        let mut metrics = PulseMetrics::default();
        for thruster in &selected {
            let mass_flow = thruster.thrust_n / (thruster.isp_seconds * G0_MPS2);
            let mass_per_pulse = mass_flow * effective_duration;
            let impulse_per_pulse = thruster.thrust_n * effective_duration;
            metrics.propellant_kg += mass_per_pulse * count;
            metrics.total_impulse_ns += impulse_per_pulse * count;
        }
        metrics.thrusters_fired = selected.len();

        resources.record_propellant_usage(tank, metrics.propellant_kg, get_seconds, source, logger);
        self.total_pulses += 1;
        self.total_impulse_ns += metrics.total_impulse_ns;
        logger.note(
            get_seconds,
            "rcs",
            source,
            format!("{} thruster(s) fired, {:.4}kg, {:.2}Ns", metrics.thrusters_fired, metrics.propellant_kg, metrics.total_impulse_ns),
        );
        metrics
    }

    /// Lifetime pulse count.
    #[must_use]
    pub fn total_pulses(&self) -> u64 { self.total_pulses }

    /// Lifetime accumulated impulse in newton-seconds.
    #[must_use]
    pub fn total_impulse_ns(&self) -> f64 { self.total_impulse_ns }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thruster(id: &str) -> Thruster {
        Thruster {
            id: id.to_string(),
            craft_id: "csm".to_string(),
            translation_axes: vec![TranslationAxis::X],
            torque_axes: vec![TorqueAxis::Pitch],
            thrust_n: 440.0,
            isp_seconds: 290.0,
            tank: Tank::CsmRcs,
        }
    }

    #[test]
    fn selects_by_axis_and_truncates_to_max_thrusters() {
        let mut rcs = RcsController::new(vec![thruster("b"), thruster("a"), thruster("c")], 0.01);
        let mut resources = crate::resources::ResourceSystem::new(
            crate::resources::ResourceState::nominal(),
            crate::resources::PropulsionBudget::default(),
            vec![],
        );
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        let params = PulseParams { axis: Some(TranslationAxis::X), duty_cycle: 1.0, max_thrusters: Some(2), ..Default::default() };
        let metrics = rcs.fire(&params, &mut resources, 0.0, "test", &mut logger);
        assert_eq!(metrics.thrusters_fired, 2);
        assert!(metrics.propellant_kg > 0.0);
    }

    #[test]
    fn no_matching_thrusters_yields_zero_metrics() {
        let mut rcs = RcsController::new(vec![thruster("a")], 0.01);
        let mut resources = crate::resources::ResourceSystem::new(
            crate::resources::ResourceState::nominal(),
            crate::resources::PropulsionBudget::default(),
            vec![],
        );
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        let params = PulseParams { craft_id: Some("lm".into()), duty_cycle: 1.0, ..Default::default() };
        let metrics = rcs.fire(&params, &mut resources, 0.0, "test", &mut logger);
        assert_eq!(metrics.thrusters_fired, 0);
    }
}
