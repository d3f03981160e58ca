//! Subject category detected for a document.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Dominant subject of a document, chosen once per parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedCategory {
    Math,
    Physics,
    Chemistry,
    Biology,
    Literature,
    History,
    English,
    #[default]
    Generic,
}

impl DetectedCategory {
    /// All categories in tie-break order.
    pub const ALL: [DetectedCategory; 8] = [
        DetectedCategory::Math,
        DetectedCategory::Physics,
        DetectedCategory::Chemistry,
        DetectedCategory::Biology,
        DetectedCategory::Literature,
        DetectedCategory::History,
        DetectedCategory::English,
        DetectedCategory::Generic,
    ];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedCategory::Math => "math",
            DetectedCategory::Physics => "physics",
            DetectedCategory::Chemistry => "chemistry",
            DetectedCategory::Biology => "biology",
            DetectedCategory::Literature => "literature",
            DetectedCategory::History => "history",
            DetectedCategory::English => "english",
            DetectedCategory::Generic => "generic",
        }
    }
}

impl std::fmt::Display for DetectedCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectedCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        DetectedCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}
