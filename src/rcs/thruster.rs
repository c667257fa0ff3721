use crate::resources::Tank;

/// A translation (delta-v) thrust axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TranslationAxis {
    X,
    Y,
    Z,
}

/// A torque (rotation) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TorqueAxis {
    Roll,
    Pitch,
    Yaw,
}

/// A single RCS thruster: which craft it belongs to, which axes it serves,
/// and its performance characteristics.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Thruster {
    pub id: String,
    pub craft_id: String,
    pub translation_axes: Vec<TranslationAxis>,
    pub torque_axes: Vec<TorqueAxis>,
    pub thrust_n: f64,
    pub isp_seconds: f64,
    pub tank: Tank,
}
