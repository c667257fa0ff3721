/// Weighting coefficients for the score rollup (§4.10).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ScoreWeights {
    pub power: f64,
    pub delta_v: f64,
    pub thermal: f64,
    pub event: f64,
    pub resource: f64,
    pub fault: f64,
    pub manual: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { power: 0.5, delta_v: 0.4, thermal: 0.1, event: 0.5, resource: 0.3, fault: 0.2, manual: 0.1 }
    }
}

/// Thresholds for the resource-health ramp functions (§4.10).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ScoreThresholds {
    pub power_warning_pct: f64,
    pub power_ideal_pct: f64,
    pub delta_v_failure_mps: f64,
    pub delta_v_ideal_mps: f64,
    pub thermal_critical_seconds: f64,
    pub thermal_violation_rate_pct_per_hr: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            power_warning_pct: 20.0,
            power_ideal_pct: 80.0,
            delta_v_failure_mps: 0.0,
            delta_v_ideal_mps: 500.0,
            thermal_critical_seconds: 3600.0,
            thermal_violation_rate_pct_per_hr: 3.0,
        }
    }
}

/// Score system tunables (§4.10).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ScoreConfig {
    pub weights: ScoreWeights,
    pub thresholds: ScoreThresholds,
    pub fault_baseline: f64,
    pub sample_step_seconds: f64,
    pub delta_log_threshold: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            thresholds: ScoreThresholds::default(),
            fault_baseline: 10.0,
            sample_step_seconds: 300.0,
            delta_log_threshold: 5.0,
        }
    }
}
