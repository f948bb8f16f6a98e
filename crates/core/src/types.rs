//! Shared identifier and enum types.

use serde::{Deserialize, Serialize};

/// Opaque document identifier used across all collections.
pub type DocId = String;

/// Training-type tag carried by slots and denormalized onto reservations.
///
/// The roman-numeral names come from the curriculum: practical training I,
/// II and IV are bookable through this system (III is scheduled externally).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainingType {
    I,
    II,
    IV,
}

impl TrainingType {
    /// All bookable training types.
    pub const ALL: &'static [TrainingType] =
        &[TrainingType::I, TrainingType::II, TrainingType::IV];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingType::I => "I",
            TrainingType::II => "II",
            TrainingType::IV => "IV",
        }
    }
}

impl std::fmt::Display for TrainingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
