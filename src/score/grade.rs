/// A letter grade derived from the commander score (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, serde::Serialize, serde::Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

/// Maps a 0-100 commander score to a letter grade.
#[must_use]
pub fn grade_for(commander_score: f64) -> Grade {
    if commander_score >= 90.0 {
        Grade::A
    } else if commander_score >= 80.0 {
        Grade::B
    } else if commander_score >= 70.0 {
        Grade::C
    } else if commander_score >= 60.0 {
        Grade::D
    } else {
        Grade::F
    }
}
