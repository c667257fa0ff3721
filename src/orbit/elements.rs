use crate::math::Vec3D;

/// Classical orbital elements and derived quantities, computed from a
/// state vector and gravitational parameter (§4.7).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct OrbitalElements {
    pub specific_angular_momentum: f64,
    pub eccentricity: f64,
    pub inclination_rad: f64,
    pub raan_rad: f64,
    pub argument_of_periapsis_rad: f64,
    pub true_anomaly_rad: f64,
    pub periapsis_radius_m: f64,
    pub apoapsis_radius_m: Option<f64>,
    pub periapsis_altitude_m: f64,
    pub apoapsis_altitude_m: Option<f64>,
    pub period_seconds: Option<f64>,
}

const TWO_PI: f64 = std::f64::consts::TAU;

/// Derives [`OrbitalElements`] from a Cartesian state vector and the
/// primary body's gravitational parameter / mean radius.
#[must_use]
pub fn compute(position_m: Vec3D, velocity_mps: Vec3D, mu: f64, body_radius_m: f64) -> OrbitalElements {
    let r = position_m.norm();
    let h_vec = position_m.cross(velocity_mps);
    let h = h_vec.norm();

    let ecc_vec = velocity_mps.cross(h_vec).scaled(1.0 / mu) - position_m.scaled(1.0 / r);
    let e = ecc_vec.norm();

    let node_vec = Vec3D::new(0.0, 0.0, 1.0).cross(h_vec);
    let node = node_vec.norm();

    let inclination = (h_vec.z() / h).acos();

    let raan = if node.abs() < 1e-12 {
        0.0
    } else {
        let mut raan = (node_vec.x() / node).acos();
        if node_vec.y() < 0.0 {
            raan = TWO_PI - raan;
        }
        raan
    };

    let arg_periapsis = if node.abs() < 1e-12 || e < 1e-12 {
        0.0
    } else {
        let mut w = (node_vec.dot(ecc_vec) / (node * e)).clamp(-1.0, 1.0).acos();
        if ecc_vec.z() < 0.0 {
            w = TWO_PI - w;
        }
        w
    };

    let true_anomaly = if e < 1e-12 {
        // Undefined for a circular orbit; the eccentricity vector has no
        // direction to measure from.
        0.0
    } else {
        let mut ta = (ecc_vec.dot(position_m) / (e * r)).clamp(-1.0, 1.0).acos();
        if position_m.dot(velocity_mps) < 0.0 {
            ta = TWO_PI - ta;
        }
        ta
    };

    let semi_latus_rectum = h * h / mu;
    let periapsis_radius = semi_latus_rectum / (1.0 + e);
    let (apoapsis_radius, period) = if e < 1.0 {
        let apo = semi_latus_rectum / (1.0 - e);
        let a = (periapsis_radius + apo) / 2.0;
        let period = TWO_PI * (a.powi(3) / mu).sqrt();
        (Some(apo), Some(period))
    } else {
        (None, None)
    };

    OrbitalElements {
        specific_angular_momentum: h,
        eccentricity: e,
        inclination_rad: inclination,
        raan_rad: raan,
        argument_of_periapsis_rad: arg_periapsis,
        true_anomaly_rad: true_anomaly,
        periapsis_radius_m: periapsis_radius,
        apoapsis_radius_m: apoapsis_radius,
        periapsis_altitude_m: periapsis_radius - body_radius_m,
        apoapsis_altitude_m: apoapsis_radius.map(|a| a - body_radius_m),
        period_seconds: period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_equatorial_orbit_has_zero_eccentricity_and_inclination() {
        let mu = 3.986_004_418e14;
        let r = 6_778_137.0;
        let v = (mu / r).sqrt();
        let elements = compute(Vec3D::new(r, 0.0, 0.0), Vec3D::new(0.0, v, 0.0), mu, 6_378_137.0);
        assert!(elements.eccentricity < 1e-6);
        assert!(elements.inclination_rad.abs() < 1e-6);
        assert!(elements.period_seconds.is_some());
    }
}
