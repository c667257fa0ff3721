/// A discrete panel switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum PanelSwitchPosition {
    Off,
    On,
    Auto,
    Manual,
    Up,
    Down,
    Norm,
}
