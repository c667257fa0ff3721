//! The Orbit Propagator (C7): a two-body RK4 integrator plus impulsive
//! maneuver application and derived orbital elements (§4.7 of the design
//! spec).

mod elements;
mod state;

pub use elements::{compute as compute_elements, OrbitalElements};
pub use state::{HistorySample, ImpulseLogEntry, PrimaryBody, StateVector};

use crate::logging::MissionLogger;
use crate::math::Vec3D;
use std::collections::VecDeque;

/// The maximum RK4 substep (§4.7): longer ticks are subdivided.
pub const MAX_SUBSTEP_SECONDS: f64 = 5.0;

/// The reference frame an impulsive delta-v is applied in, relative to the
/// current state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BurnFrame {
    Prograde,
    Retrograde,
    Normal,
    Antinormal,
    Radial,
    RadialIn,
}

impl Default for BurnFrame {
    fn default() -> Self { BurnFrame::Prograde }
}

/// Where to aim a delta-v impulse when no explicit vector/direction is
/// given to `apply_delta_v`.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub enum DeltaVAim {
    Vector(Vec3D),
    Frame(BurnFrame),
}

fn resolve_direction(state: &StateVector, aim: DeltaVAim) -> Vec3D {
    match aim {
        DeltaVAim::Vector(v) => v.normalized().unwrap_or(Vec3D::new(1.0, 0.0, 0.0)),
        DeltaVAim::Frame(frame) => {
            let prograde = state.velocity_mps.normalized().unwrap_or(Vec3D::new(1.0, 0.0, 0.0));
            let radial = state.position_m.normalized().unwrap_or(Vec3D::new(1.0, 0.0, 0.0));
            let normal = state.position_m.cross(state.velocity_mps).normalized().unwrap_or(Vec3D::new(0.0, 0.0, 1.0));
            match frame {
                BurnFrame::Prograde => prograde,
                BurnFrame::Retrograde => prograde.scaled(-1.0),
                BurnFrame::Normal => normal,
                BurnFrame::Antinormal => normal.scaled(-1.0),
                BurnFrame::Radial => radial,
                BurnFrame::RadialIn => radial.scaled(-1.0),
            }
        }
    }
}

/// Default cap on retained impulse log entries / history samples.
pub const DEFAULT_IMPULSE_LOG_CAP: usize = 200;
pub const DEFAULT_HISTORY_CAP: usize = 360;
pub const DEFAULT_HISTORY_CADENCE_SECONDS: f64 = 60.0;

/// The live orbit propagator: primary body, state vector, and history.
#[derive(Debug, Clone)]
pub struct OrbitPropagator {
    body: PrimaryBody,
    state: StateVector,
    time_seconds: f64,
    epoch_seconds: f64,
    impulse_log: VecDeque<ImpulseLogEntry>,
    impulse_log_cap: usize,
    history: VecDeque<HistorySample>,
    history_cap: usize,
    history_cadence_seconds: f64,
    time_since_last_sample_seconds: f64,
}

impl OrbitPropagator {
    #[must_use]
    pub fn new(body: PrimaryBody, state: StateVector, epoch_seconds: f64) -> Self {
        Self {
            body,
            state,
            time_seconds: epoch_seconds,
            epoch_seconds,
            impulse_log: VecDeque::new(),
            impulse_log_cap: DEFAULT_IMPULSE_LOG_CAP,
            history: VecDeque::new(),
            history_cap: DEFAULT_HISTORY_CAP,
            history_cadence_seconds: DEFAULT_HISTORY_CADENCE_SECONDS,
            time_since_last_sample_seconds: 0.0,
        }
    }

    /// Overrides the default history sampling cadence and retained sample
    /// cap.
    pub fn set_history_config(&mut self, cadence_seconds: f64, cap: usize) {
        self.history_cadence_seconds = cadence_seconds.max(1.0);
        self.history_cap = cap.max(1);
    }

    #[must_use]
    pub fn state(&self) -> StateVector { self.state }

    #[must_use]
    pub fn body(&self) -> PrimaryBody { self.body }

    /// Advances the state vector by `dt_seconds`, split into substeps of at
    /// most [`MAX_SUBSTEP_SECONDS`], each integrated with classical RK4
    /// under two-body gravity plus a constant external `acceleration_mps2`
    /// (§4.7).
    pub fn update(&mut self, dt_seconds: f64, get_seconds: f64, acceleration_mps2: Vec3D) {
        let mut remaining = dt_seconds;
        while remaining > 1e-12 {
            let substep = remaining.min(MAX_SUBSTEP_SECONDS);
            self.state = rk4_step(self.state, substep, self.body.mu, acceleration_mps2);
            remaining -= substep;
        }
        self.time_seconds = get_seconds;
        self.time_since_last_sample_seconds += dt_seconds;
        if self.time_since_last_sample_seconds >= self.history_cadence_seconds {
            self.sample_history(get_seconds);
            self.time_since_last_sample_seconds = 0.0;
        }
    }

    fn sample_history(&mut self, get_seconds: f64) {
        let radius = self.state.position_m.norm();
        let sample = HistorySample {
            get_seconds,
            radius_m: radius,
            altitude_m: radius - self.body.radius_m,
            speed_mps: self.state.velocity_mps.norm(),
        };
        if self.history.len() >= self.history_cap {
            self.history.pop_front();
        }
        self.history.push_back(sample);
    }

    /// Applies an impulsive delta-v of `magnitude_mps` along `aim`,
    /// resolved against the current state vector when `aim` is a frame
    /// (§4.7). Logs the impulse and forces a history sample.
    pub fn apply_delta_v(
        &mut self,
        magnitude_mps: f64,
        aim: DeltaVAim,
        get_seconds: f64,
        metadata: Option<String>,
        logger: &mut MissionLogger,
    ) {
        let direction = resolve_direction(&self.state, aim);
        self.state.velocity_mps = self.state.velocity_mps + direction.scaled(magnitude_mps);
        if self.impulse_log.len() >= self.impulse_log_cap {
            self.impulse_log.pop_front();
        }
        self.impulse_log.push_back(ImpulseLogEntry { get_seconds, delta_v_mps: magnitude_mps, direction, metadata: metadata.clone() });
        self.sample_history(get_seconds);
        self.time_since_last_sample_seconds = 0.0;
        logger.event(
            get_seconds,
            "orbit",
            "orbit_propagator",
            format!("impulse {magnitude_mps:+.3}m/s along {direction}{}", metadata.map(|m| format!(" ({m})")).unwrap_or_default()),
        );
    }

    /// Computes the current orbital elements and packages them with
    /// integrator bookkeeping (§3/§4.7).
    #[must_use]
    pub fn summary(&self) -> OrbitSummary {
        OrbitSummary {
            body: self.body,
            state: self.state,
            time_seconds: self.time_seconds,
            epoch_seconds: self.epoch_seconds,
            elements: elements::compute(self.state.position_m, self.state.velocity_mps, self.body.mu, self.body.radius_m),
            impulse_log: self.impulse_log.iter().cloned().collect(),
            history: self.history.iter().copied().collect(),
        }
    }
}

/// A point-in-time snapshot of the orbit propagator, suitable for frame /
/// summary payloads.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrbitSummary {
    pub body: PrimaryBody,
    pub state: StateVector,
    pub time_seconds: f64,
    pub epoch_seconds: f64,
    pub elements: OrbitalElements,
    pub impulse_log: Vec<ImpulseLogEntry>,
    pub history: Vec<HistorySample>,
}

fn acceleration(position_m: Vec3D, mu: f64, external_mps2: Vec3D) -> Vec3D {
    let r = position_m.norm();
    let gravity = position_m.scaled(-mu / r.powi(3));
    gravity + external_mps2
}

fn rk4_step(state: StateVector, dt: f64, mu: f64, external_mps2: Vec3D) -> StateVector {
    let derivative = |s: StateVector| StateVector {
        position_m: s.velocity_mps,
        velocity_mps: acceleration(s.position_m, mu, external_mps2),
    };
    let add_scaled = |s: StateVector, d: StateVector, h: f64| StateVector {
        position_m: s.position_m + d.position_m.scaled(h),
        velocity_mps: s.velocity_mps + d.velocity_mps.scaled(h),
    };

    let k1 = derivative(state);
    let k2 = derivative(add_scaled(state, k1, dt / 2.0));
    let k3 = derivative(add_scaled(state, k2, dt / 2.0));
    let k4 = derivative(add_scaled(state, k3, dt));

    StateVector {
        position_m: state.position_m + (k1.position_m + k2.position_m.scaled(2.0) + k3.position_m.scaled(2.0) + k4.position_m).scaled(dt / 6.0),
        velocity_mps: state.velocity_mps + (k1.velocity_mps + k2.velocity_mps.scaled(2.0) + k3.velocity_mps.scaled(2.0) + k4.velocity_mps).scaled(dt / 6.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circular_orbit() -> OrbitPropagator {
        let body = PrimaryBody::earth();
        let r = 6_778_137.0;
        let v = (body.mu / r).sqrt();
        let state = StateVector { position_m: Vec3D::new(r, 0.0, 0.0), velocity_mps: Vec3D::new(0.0, v, 0.0) };
        OrbitPropagator::new(body, state, 0.0)
    }

    #[test]
    fn circular_orbit_conserves_radius_over_one_period() {
        let mut orbit = circular_orbit();
        let elements = orbit.summary().elements;
        let period = elements.period_seconds.unwrap();
        let initial_radius = orbit.state().position_m.norm();
        let mut elapsed = 0.0;
        while elapsed < period {
            orbit.update(5.0, elapsed, Vec3D::ZERO);
            elapsed += 5.0;
        }
        let final_radius = orbit.state().position_m.norm();
        assert!((final_radius - initial_radius).abs() / initial_radius < 1e-3);
    }

    #[test]
    fn prograde_delta_v_raises_apoapsis() {
        let mut orbit = circular_orbit();
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        let before = orbit.summary().elements.apoapsis_radius_m.unwrap();
        orbit.apply_delta_v(50.0, DeltaVAim::Frame(BurnFrame::Prograde), 0.0, None, &mut logger);
        let after = orbit.summary().elements.apoapsis_radius_m.unwrap();
        assert!(after > before);
        assert_eq!(orbit.summary().impulse_log.len(), 1);
    }
}
