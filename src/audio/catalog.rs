/// A ducking contribution a bus applies to `target_bus_id` while something
/// is actively playing on it (§3: "Audio Catalog").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DuckingRule {
    pub target_bus_id: String,
    pub gain_linear: f64,
}

/// One mixer bus: its concurrency/pending caps and ducking rules.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioBus {
    pub id: String,
    pub max_concurrent: usize,
    pub max_pending: usize,
    pub ducking: Vec<DuckingRule>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioCategory {
    pub id: String,
    pub bus_id: String,
    pub default_priority: f64,
    pub cooldown_seconds: f64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioCue {
    pub id: String,
    pub bus_id: Option<String>,
    pub category_id: Option<String>,
    pub length_seconds: f64,
    pub is_loop: bool,
    pub cooldown_seconds: Option<f64>,
    pub priority: Option<f64>,
}

/// The static audio catalog loaded at dispatcher construction.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AudioCatalog {
    pub buses: Vec<AudioBus>,
    pub categories: Vec<AudioCategory>,
    pub cues: Vec<AudioCue>,
}

impl AudioCatalog {
    #[must_use]
    pub fn bus(&self, bus_id: &str) -> Option<&AudioBus> { self.buses.iter().find(|b| b.id == bus_id) }

    #[must_use]
    pub fn category(&self, category_id: &str) -> Option<&AudioCategory> { self.categories.iter().find(|c| c.id == category_id) }

    #[must_use]
    pub fn cue(&self, cue_id: &str) -> Option<&AudioCue> { self.cues.iter().find(|c| c.id == cue_id) }
}
