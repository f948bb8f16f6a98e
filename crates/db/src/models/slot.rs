//! The `slots` collection: administrator-defined bookable time windows.

use chrono::NaiveDate;
use practicum_core::cache::CacheEntry;
use practicum_core::error::DomainError;
use practicum_core::time;
use practicum_core::types::TrainingType;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A bookable time window on a calendar date, with its embedded
/// availability cache. The cache is a materialized view of the slot's
/// non-cancelled reservations; only booking side effects and the repair
/// tool may touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    /// `HH:MM` wall-clock bounds of the window.
    pub start_time: String,
    pub end_time: String,
    pub training_type: TrainingType,
    pub max_capacity: u32,
    pub is_active: bool,
    #[serde(default)]
    pub availability_cache: Vec<CacheEntry>,
}

impl Slot {
    /// Slot bounds in minutes since midnight.
    pub fn bounds_minutes(&self) -> Result<(u16, u16), DomainError> {
        Ok((
            time::parse_minutes(&self.start_time)?,
            time::parse_minutes(&self.end_time)?,
        ))
    }

    /// True when any cached entry is still active (applied or confirmed);
    /// such slots may not be deleted.
    pub fn has_active_reservations(&self) -> bool {
        self.availability_cache
            .iter()
            .any(|e| e.status.is_active())
    }
}

/// Payload for creating one slot.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct CreateSlot {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub training_type: TrainingType,
    #[validate(range(min = 1, message = "max_capacity must be at least 1"))]
    pub max_capacity: u32,
}

impl CreateSlot {
    /// Validate the payload beyond what the derive covers: parseable,
    /// non-inverted bounds.
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        let start = time::parse_minutes(&self.start_time)?;
        let end = time::parse_minutes(&self.end_time)?;
        if start >= end {
            return Err(DomainError::Validation(format!(
                "Slot bounds are inverted or empty: {} >= {}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }

    pub fn into_slot(self) -> Slot {
        Slot {
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            training_type: self.training_type,
            max_capacity: self.max_capacity,
            is_active: true,
            availability_cache: Vec::new(),
        }
    }
}

/// Payload for templated batch creation: one slot per date, sharing the
/// same bounds, type and capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotBatch {
    pub dates: Vec<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    pub training_type: TrainingType,
    pub max_capacity: u32,
}

impl CreateSlotBatch {
    pub fn templates(&self) -> Vec<CreateSlot> {
        self.dates
            .iter()
            .map(|&date| CreateSlot {
                date,
                start_time: self.start_time.clone(),
                end_time: self.end_time.clone(),
                training_type: self.training_type,
                max_capacity: self.max_capacity,
            })
            .collect()
    }
}

/// Admin edit of a slot's fixed bounds. Edits do not cascade to the
/// denormalized snapshot fields on existing reservations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSlot {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub max_capacity: Option<u32>,
    pub is_active: Option<bool>,
}
