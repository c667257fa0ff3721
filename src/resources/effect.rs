use super::state::ResourceState;
use std::collections::BTreeMap;

/// A tagged leaf value in an effect map (§9 design note): numeric leaves
/// accumulate onto existing numeric fields, everything else replaces.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Number(f64),
    Bool(bool),
    String(String),
    SubMap(EffectMap),
}

/// A nested effect map, as carried by an event's `success_effects` /
/// `failure_effects`, or applied directly via `apply_effect` with
/// `EffectOrigin::Manual`.
pub type EffectMap = BTreeMap<String, EffectValue>;

/// Applies `effect` onto `state`'s known scalar/nested fields, and records
/// any `failure_id` string leaf into `failures`. Fields not present on
/// `ResourceState` are ignored (by design: the core does not carry a
/// dynamic bag of arbitrary keys — see DESIGN.md).
pub fn apply_effect_map(
    state: &mut ResourceState,
    effect: &EffectMap,
    failures: &mut std::collections::BTreeSet<String>,
) {
    for (key, value) in effect {
        match key.as_str() {
            "power_margin_pct" => accumulate_f64(&mut state.power_margin_pct, value),
            "cryo_boiloff_rate_pct_per_hr" => accumulate_f64(&mut state.cryo_boiloff_rate_pct_per_hr, value),
            "delta_v_margin_mps" => accumulate_f64(&mut state.delta_v_margin_mps, value),
            "thermal_balance_state" => {
                if let EffectValue::String(s) = value {
                    state.thermal_balance_state.clone_from(s);
                }
            }
            "ptc_active" => {
                if let EffectValue::Bool(b) = value {
                    state.ptc_active = *b;
                }
            }
            "failure_id" => {
                if let EffectValue::String(id) = value {
                    failures.insert(id.clone());
                }
            }
            "power" => {
                if let EffectValue::SubMap(m) = value {
                    apply_power(state, m);
                }
            }
            "propellant" => {
                if let EffectValue::SubMap(m) = value {
                    apply_propellant(state, m);
                }
            }
            "life_support" => {
                if let EffectValue::SubMap(m) = value {
                    apply_life_support(state, m);
                }
            }
            // "delta_v" (stage adjustments) is handled by the caller, which
            // also owns the propulsion budget; ResourceState has no field
            // for it directly.
            _ => {}
        }
    }
}

fn accumulate_f64(field: &mut f64, value: &EffectValue) {
    match value {
        EffectValue::Number(delta) => *field += delta,
        EffectValue::String(_) | EffectValue::Bool(_) | EffectValue::SubMap(_) => {}
    }
}

fn apply_power(state: &mut ResourceState, m: &EffectMap) {
    for (key, value) in m {
        match key.as_str() {
            "fuel_cell_output_kw" => accumulate_f64(&mut state.power.fuel_cell_output_kw, value),
            "fuel_cell_load_kw" => accumulate_f64(&mut state.power.fuel_cell_load_kw, value),
            "battery_charge_pct" => accumulate_f64(&mut state.power.battery_charge_pct, value),
            "reactant_minutes_remaining" => accumulate_f64(&mut state.power.reactant_minutes_remaining, value),
            other => {
                if let EffectValue::Number(delta) = value {
                    *state.power.loads.entry(other.to_string()).or_insert(0.0) += delta;
                }
            }
        }
    }
}

fn apply_propellant(state: &mut ResourceState, m: &EffectMap) {
    for (key, value) in m {
        if let Some(tank) = super::Tank::from_key(key) {
            let mut current = state.propellant.get(tank);
            accumulate_f64(&mut current, value);
            state.propellant.set(tank, current);
        }
    }
}

fn apply_life_support(state: &mut ResourceState, m: &EffectMap) {
    for (key, value) in m {
        match key.as_str() {
            "o2_kg" => accumulate_f64(&mut state.life_support.o2_kg, value),
            "water_kg" => accumulate_f64(&mut state.life_support.water_kg, value),
            "co2_scrubber_pct_remaining" => accumulate_f64(&mut state.life_support.co2_scrubber_pct_remaining, value),
            "cabin_pressure_psi" => accumulate_f64(&mut state.life_support.cabin_pressure_psi, value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_leaves_accumulate_and_failure_id_is_recorded() {
        let mut state = ResourceState::nominal();
        let mut failures = std::collections::BTreeSet::new();
        let mut effect = EffectMap::new();
        effect.insert("power_margin_pct".into(), EffectValue::Number(-5.0));
        effect.insert("failure_id".into(), EffectValue::String("fc_overload".into()));
        let before = state.power_margin_pct;
        apply_effect_map(&mut state, &effect, &mut failures);
        assert!((state.power_margin_pct - (before - 5.0)).abs() < 1e-9);
        assert!(failures.contains("fc_overload"));
    }

    #[test]
    fn string_leaf_replaces_rather_than_accumulates() {
        let mut state = ResourceState::nominal();
        let mut failures = std::collections::BTreeSet::new();
        let mut effect = EffectMap::new();
        effect.insert("thermal_balance_state".into(), EffectValue::String("warm_side".into()));
        apply_effect_map(&mut state, &effect, &mut failures);
        assert_eq!(state.thermal_balance_state, "warm_side");
    }

    #[test]
    fn nested_propellant_submap_accumulates_tank_mass() {
        let mut state = ResourceState::nominal();
        let mut failures = std::collections::BTreeSet::new();
        let mut inner = EffectMap::new();
        inner.insert("csm_rcs_kg".into(), EffectValue::Number(-10.0));
        let mut effect = EffectMap::new();
        effect.insert("propellant".into(), EffectValue::SubMap(inner));
        let before = state.propellant.csm_rcs_kg;
        apply_effect_map(&mut state, &effect, &mut failures);
        assert!((state.propellant.csm_rcs_kg - (before - 10.0)).abs() < 1e-9);
    }
}
