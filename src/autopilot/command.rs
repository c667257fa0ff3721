use crate::orbit::BurnFrame;
use crate::resources::Tank;

/// One scripted autopilot command (§4.5).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum AutopilotCommand {
    AttitudeHold,
    UllageFire { duration_seconds: f64 },
    Throttle { level: f64 },
    ThrottleRamp { from: Option<f64>, to: f64, duration_seconds: f64 },
    RcsPulse(crate::rcs::PulseParams),
    DskyEntry { verb: u32, noun: u32, program: u32, registers: [f64; 2] },
}

/// A single entry in an autopilot's command sequence.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScriptCommand {
    pub time_seconds: f64,
    pub command: AutopilotCommand,
}

/// Propulsion tank/mass-flow configuration for a burn, plus an optional
/// ullage motor configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PropulsionProfile {
    pub tank: Tank,
    pub mass_flow_kg_per_sec: f64,
    pub ullage: Option<UllageProfile>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UllageProfile {
    pub tank: Tank,
    pub mass_flow_kg_per_sec: f64,
}

/// Acceptance bounds on the achieved burn, `(min, max)`.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ToleranceRange {
    pub min: f64,
    pub max: f64,
}

impl ToleranceRange {
    #[must_use]
    pub fn contains(self, value: f64) -> bool { value >= self.min && value <= self.max }
}

/// Optional acceptance tolerances on the achieved burn (§4.5).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct Tolerances {
    pub burn_duration_seconds: Option<ToleranceRange>,
    pub propellant_kg: Option<ToleranceRange>,
    pub delta_v_mps: Option<ToleranceRange>,
}

/// A static autopilot definition (§3: "Autopilot").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AutopilotDefinition {
    pub id: String,
    pub description: String,
    pub sequence: Vec<ScriptCommand>,
    pub tolerances: Tolerances,
    pub propulsion: PropulsionProfile,
    pub direction: BurnFrame,
}

impl AutopilotDefinition {
    /// Derived duration: the latest `time + duration` across the sequence
    /// (§3), falling back to the latest bare command time when no command
    /// carries its own duration.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.sequence
            .iter()
            .map(|s| {
                let extra = match &s.command {
                    AutopilotCommand::UllageFire { duration_seconds } => *duration_seconds,
                    AutopilotCommand::ThrottleRamp { duration_seconds, .. } => *duration_seconds,
                    _ => 0.0,
                };
                s.time_seconds + extra
            })
            .fold(0.0_f64, f64::max)
    }
}
