use crate::math::Vec3D;

/// The primary gravitating body (§3: "Orbit State").
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct PrimaryBody {
    pub id: String,
    pub mu: f64,
    pub radius_m: f64,
    pub soi_radius_m: f64,
}

impl PrimaryBody {
    #[must_use]
    pub fn earth() -> Self {
        Self { id: "earth".to_string(), mu: 3.986_004_418e14, radius_m: 6_378_137.0, soi_radius_m: 9.24e8 }
    }

    #[must_use]
    pub fn moon() -> Self {
        Self { id: "moon".to_string(), mu: 4.902_800_66e12, radius_m: 1_737_400.0, soi_radius_m: 6.6e7 }
    }
}

/// The Cartesian state vector, in the primary body's inertial frame.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct StateVector {
    pub position_m: Vec3D,
    pub velocity_mps: Vec3D,
}

/// One impulsive maneuver record, capped by a rolling log (§4.7).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ImpulseLogEntry {
    pub get_seconds: f64,
    pub delta_v_mps: f64,
    pub direction: Vec3D,
    pub metadata: Option<String>,
}

/// One time-stamped sample in the rolling history buffer (§3).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct HistorySample {
    pub get_seconds: f64,
    pub radius_m: f64,
    pub altitude_m: f64,
    pub speed_mps: f64,
}
