/// A static checklist step, as loaded from mission data (§3: "Checklist").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChecklistStepDefinition {
    pub action: String,
    pub expected_response: String,
    pub reference: String,
}

/// A static checklist definition.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChecklistDefinition {
    pub id: String,
    pub title: String,
    pub crew_role: String,
    pub nominal_get_seconds: f64,
    pub steps: Vec<ChecklistStepDefinition>,
    pub audio_cue_complete: Option<String>,
}

/// Per-tick runtime state of a single checklist step.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StepState {
    pub acknowledged: bool,
    pub acknowledged_at_seconds: Option<f64>,
    pub actor: Option<String>,
}
