// Experience Tier Derivation

use serde::{Deserialize, Serialize};

/// Phrases that mean "no prior experience required"
const NO_EXPERIENCE_PHRASES: [&str; 2] = ["no experience", "sin experiencia"];

/// Experience bucket used by the aggregation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    Semisenior,
    Senior,
}

impl ExperienceLevel {
    /// Buckets in reporting order
    pub const ALL: [ExperienceLevel; 3] = [
        ExperienceLevel::Junior,
        ExperienceLevel::Semisenior,
        ExperienceLevel::Senior,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Semisenior => "semisenior",
            ExperienceLevel::Senior => "senior",
        }
    }

    /// Bucket for a number of years (0..=2 junior, 3..=4 semisenior, 5+ senior)
    pub fn from_years(years: u64) -> Self {
        match years {
            0..=2 => ExperienceLevel::Junior,
            3..=4 => ExperienceLevel::Semisenior,
            _ => ExperienceLevel::Senior,
        }
    }

    /// Derive the bucket from a stored experience string
    ///
    /// Absent, blank, or "no experience" text is `Junior`. Otherwise the
    /// leading integer decides; text without one is not derivable and
    /// returns `None`.
    pub fn from_raw(raw: Option<&str>) -> Option<Self> {
        let text = match raw.map(str::trim) {
            None | Some("") => return Some(ExperienceLevel::Junior),
            Some(text) => text,
        };

        let lowered = text.to_lowercase();
        if NO_EXPERIENCE_PHRASES.iter().any(|p| lowered == *p) {
            return Some(ExperienceLevel::Junior);
        }

        let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }

        // Absurdly long digit runs saturate into the top bucket
        let years = digits.parse::<u64>().unwrap_or(u64::MAX);
        Some(Self::from_years(years))
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
