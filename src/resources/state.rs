use super::communications::CommsFields;
use super::Tank;
use std::collections::HashMap;

/// Power subsystem state: fuel cell output/load, battery charge, and
/// reactant endurance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PowerState {
    pub fuel_cell_output_kw: f64,
    pub fuel_cell_load_kw: f64,
    pub battery_charge_pct: f64,
    pub reactant_minutes_remaining: f64,
    /// Named load contributors beyond the two well-known fields above,
    /// keyed by metric name (e.g. a comms pass's load delta).
    pub loads: HashMap<String, f64>,
}

impl PowerState {
    #[must_use]
    pub fn nominal() -> Self {
        Self {
            fuel_cell_output_kw: 4.5,
            fuel_cell_load_kw: 3.0,
            battery_charge_pct: 100.0,
            reactant_minutes_remaining: 20_000.0,
            loads: HashMap::new(),
        }
    }
}

/// Propellant masses per tank, in kilograms.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PropellantState {
    pub csm_sps_kg: f64,
    pub csm_rcs_kg: f64,
    pub lm_descent_kg: f64,
    pub lm_ascent_kg: f64,
    pub lm_rcs_kg: f64,
}

impl PropellantState {
    #[must_use]
    pub fn get(&self, tank: Tank) -> f64 {
        match tank {
            Tank::CsmSps => self.csm_sps_kg,
            Tank::CsmRcs => self.csm_rcs_kg,
            Tank::LmDescent => self.lm_descent_kg,
            Tank::LmAscent => self.lm_ascent_kg,
            Tank::LmRcs => self.lm_rcs_kg,
        }
    }

    pub fn set(&mut self, tank: Tank, value: f64) {
        let field = match tank {
            Tank::CsmSps => &mut self.csm_sps_kg,
            Tank::CsmRcs => &mut self.csm_rcs_kg,
            Tank::LmDescent => &mut self.lm_descent_kg,
            Tank::LmAscent => &mut self.lm_ascent_kg,
            Tank::LmRcs => &mut self.lm_rcs_kg,
        };
        *field = value.max(0.0);
    }
}

/// Life support consumables: O2, water, CO2 scrubber capacity.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LifeSupportState {
    pub o2_kg: f64,
    pub water_kg: f64,
    pub co2_scrubber_pct_remaining: f64,
    pub cabin_pressure_psi: f64,
}

impl LifeSupportState {
    #[must_use]
    pub fn nominal() -> Self {
        Self { o2_kg: 25.0, water_kg: 140.0, co2_scrubber_pct_remaining: 100.0, cabin_pressure_psi: 5.0 }
    }
}

/// The full resource state record (§3 of the design spec).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResourceState {
    pub power_margin_pct: f64,
    pub cryo_boiloff_rate_pct_per_hr: f64,
    pub thermal_balance_state: String,
    pub ptc_active: bool,
    pub delta_v_margin_mps: f64,
    pub power: PowerState,
    pub propellant: PropellantState,
    pub life_support: LifeSupportState,
    pub communications: CommsFields,
}

impl ResourceState {
    /// A nominal initial state: full margins, PTC inactive, nominal tanks.
    #[must_use]
    pub fn nominal() -> Self {
        Self {
            power_margin_pct: 100.0,
            cryo_boiloff_rate_pct_per_hr: 0.5,
            thermal_balance_state: "nominal".to_string(),
            ptc_active: false,
            delta_v_margin_mps: 0.0,
            power: PowerState::nominal(),
            propellant: PropellantState {
                csm_sps_kg: 18_000.0,
                csm_rcs_kg: 300.0,
                lm_descent_kg: 8_200.0,
                lm_ascent_kg: 2_350.0,
                lm_rcs_kg: 150.0,
            },
            life_support: LifeSupportState::nominal(),
            communications: CommsFields::idle(),
        }
    }
}
