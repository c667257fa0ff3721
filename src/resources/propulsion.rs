use super::Tank;
use std::collections::HashMap;

/// One propulsion stage's budget (§3: "Propulsion Budget").
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct PropulsionStage {
    pub initial_kg: f64,
    pub reserve_kg: f64,
    pub usable_delta_v_mps: f64,
    pub remaining_kg: f64,
    /// Accumulated additive adjustment from `delta_v.stages.*.adjustment_mps`
    /// effect fields (e.g. a failure that derates a stage's usable delta-v).
    pub adjustment_mps: f64,
}

impl PropulsionStage {
    /// The stage's delta-v margin: `max(0, min(usable, usable * (remaining -
    /// reserve) / (initial - reserve))) + adjustment`.
    #[must_use]
    pub fn margin_mps(&self) -> f64 {
        let denom = self.initial_kg - self.reserve_kg;
        let fraction = if denom.abs() < 1e-9 {
            0.0
        } else {
            ((self.remaining_kg - self.reserve_kg) / denom).clamp(0.0, 1.0)
        };
        (self.usable_delta_v_mps * fraction).max(0.0).min(self.usable_delta_v_mps) + self.adjustment_mps
    }
}

/// Per-stage budgets for every tank that backs a delta-v stage
/// (`csm_sps`, `lm_descent`, `lm_ascent`).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PropulsionBudget {
    stages: HashMap<String, PropulsionStage>,
}

impl PropulsionBudget {
    /// Registers or replaces the budget for `tank`.
    pub fn set_stage(&mut self, tank: Tank, stage: PropulsionStage) {
        self.stages.insert(tank.to_string(), stage);
    }

    /// Updates the remaining mass for `tank`'s stage, if it backs one.
    pub fn set_remaining(&mut self, tank: Tank, remaining_kg: f64) {
        if let Some(stage) = self.stages.get_mut(&tank.to_string()) {
            stage.remaining_kg = remaining_kg;
        }
    }

    /// Accumulates an adjustment for a stage named by its wire key
    /// (`csm_sps`, `lm_descent`, `lm_ascent`), logging nothing when the
    /// stage is unknown (unrecognised stage keys are a loader-time concern).
    pub fn add_stage_adjustment(&mut self, stage_key: &str, adjustment_mps: f64) {
        if let Some(stage) = self.stages.get_mut(stage_key) {
            stage.adjustment_mps += adjustment_mps;
        }
    }

    /// The sum of every stage's delta-v margin.
    #[must_use]
    pub fn total_margin(&self) -> f64 { self.stages.values().map(PropulsionStage::margin_mps).sum() }

    /// True when no stage has been registered at all, as distinct from a
    /// registered stage sitting at zero margin (fully depleted). The score
    /// system uses this to tell "nothing to evaluate" apart from "failing".
    #[must_use]
    pub fn is_empty(&self) -> bool { self.stages.is_empty() }

    /// Converts a propellant mass delta on `tank` into an equivalent
    /// delta-v contribution for metrics purposes, using the stage's
    /// usable-delta-v-per-kg ratio. RCS tanks (no stage) contribute 0.
    #[must_use]
    pub fn consumption_to_delta_v(&self, tank: Tank, mass_kg: f64) -> f64 {
        let Some(stage) = self.stages.get(&tank.to_string()) else { return 0.0 };
        let denom = stage.initial_kg - stage.reserve_kg;
        if denom.abs() < 1e-9 {
            0.0
        } else {
            stage.usable_delta_v_mps * (mass_kg / denom)
        }
    }

    /// Read-only access to a stage's budget by wire key.
    #[must_use]
    pub fn stage(&self, stage_key: &str) -> Option<&PropulsionStage> { self.stages.get(stage_key) }
}

/// Accumulated delta-v usage/recovery, driven by every
/// `record_propellant_usage` and `apply_effect` call (§4.2 metrics).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct DeltaVMetrics {
    pub used_mps: f64,
    pub recovered_mps: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_is_zero_at_reserve_and_full_at_initial() {
        let mut stage = PropulsionStage { initial_kg: 100.0, reserve_kg: 20.0, usable_delta_v_mps: 1000.0, remaining_kg: 20.0, adjustment_mps: 0.0 };
        assert!((stage.margin_mps()).abs() < 1e-9);
        stage.remaining_kg = 100.0;
        assert!((stage.margin_mps() - 1000.0).abs() < 1e-9);
        stage.remaining_kg = 60.0;
        assert!((stage.margin_mps() - 500.0).abs() < 1e-6);
    }
}
