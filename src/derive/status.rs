use std::fmt;

use serde::Serialize;

/// Proficiency band of a pretest or post-test. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProficiencyStatus {
    #[serde(rename = "Intervention")]
    Intervention,
    #[serde(rename = "For Consolidation")]
    ForConsolidation,
    #[serde(rename = "For Enhancement")]
    ForEnhancement,
    #[serde(rename = "Proficient")]
    Proficient,
    #[serde(rename = "Highly Proficient")]
    HighlyProficient,
    #[serde(rename = "Not yet taken")]
    NotYetTaken,
}

impl ProficiencyStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Intervention => "Intervention",
            Self::ForConsolidation => "For Consolidation",
            Self::ForEnhancement => "For Enhancement",
            Self::Proficient => "Proficient",
            Self::HighlyProficient => "Highly Proficient",
            Self::NotYetTaken => "Not yet taken",
        }
    }

    /// Badge color used by the dashboard for this band.
    pub fn color(self) -> &'static str {
        match self {
            Self::Intervention => "#ff5a5a",
            Self::ForConsolidation => "#ffb37b",
            Self::ForEnhancement => "#ffe066",
            Self::Proficient => "#7ed957",
            Self::HighlyProficient => "#27ae60",
            Self::NotYetTaken => "#888",
        }
    }
}

impl fmt::Display for ProficiencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sentinel score meaning "not applicable".
pub const NOT_APPLICABLE_SCORE: f64 = -1.0;

/// Classifies `score` out of `total` into a proficiency band.
///
/// Both subscores at zero means the test was never attempted, which is
/// reported as [`ProficiencyStatus::NotYetTaken`] whatever the score. A zero
/// or non-finite total, a non-finite score, and the `-1` sentinel degrade to
/// the same result. Otherwise the percentage picks the band, with each lower
/// edge inclusive:
///
/// | Percent     | Status            |
/// |-------------|-------------------|
/// | < 25        | Intervention      |
/// | 25 to < 50  | For Consolidation |
/// | 50 to < 75  | For Enhancement   |
/// | 75 to < 85  | Proficient        |
/// | >= 85       | Highly Proficient |
pub fn classify(score: f64, total: f64, pattern: f64, numbers: f64) -> ProficiencyStatus {
    if pattern == 0.0 && numbers == 0.0 {
        return ProficiencyStatus::NotYetTaken;
    }
    if !score.is_finite() || !total.is_finite() || total == 0.0 || score == NOT_APPLICABLE_SCORE {
        return ProficiencyStatus::NotYetTaken;
    }

    match score / total * 100.0 {
        p if p < 25.0 => ProficiencyStatus::Intervention,
        p if p < 50.0 => ProficiencyStatus::ForConsolidation,
        p if p < 75.0 => ProficiencyStatus::ForEnhancement,
        p if p < 85.0 => ProficiencyStatus::Proficient,
        _ => ProficiencyStatus::HighlyProficient,
    }
}

/// Whole-number percentage shown in the progress ring. Zero when `total` is zero.
pub fn score_percent(score: i64, total: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (score as f64 / total as f64 * 100.0).round() as i64
    }
}
