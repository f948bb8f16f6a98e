//! The `reservations` collection: a student's claim on a sub-interval of
//! a slot.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use practicum_core::cache::CacheEntry;
use practicum_core::capacity::Interval;
use practicum_core::error::DomainError;
use practicum_core::reservation::{CancelledBy, ReservationStatus};
use practicum_core::time;
use practicum_core::types::TrainingType;
use serde::{Deserialize, Serialize};

use super::slot::Slot;
use crate::store::Stored;

/// One reservation document.
///
/// The `slot_*` fields are a deliberate snapshot of the slot at booking
/// time, kept for query efficiency; they may legitimately diverge from the
/// slot if an administrator later edits its bounds (no cascade).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub student_id: String,
    pub slot_id: String,
    pub status: ReservationStatus,

    // Snapshot of the slot at booking time.
    pub slot_date: NaiveDate,
    pub slot_start_time: String,
    pub slot_end_time: String,
    pub slot_training_type: TrainingType,

    /// Quantized sub-interval of the slot actually booked, `HH:MM`.
    pub custom_start_time: String,
    pub custom_end_time: String,

    /// Priority rank 1..=3; only meaningful under lottery mode.
    pub priority: Option<u8>,
    /// Set when a lottery win made this the student's first training day.
    #[serde(default)]
    pub is_first_day: bool,

    // Attendance, recorded by kiosk check-in/out or admin approval.
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub actual_minutes: Option<u16>,

    pub cancelled_at: Option<NaiveDateTime>,
    pub cancelled_by: Option<CancelledBy>,
}

impl Reservation {
    /// Build a new reservation from its slot, snapshotting the slot fields.
    pub fn new(
        student_id: &str,
        slot_id: &str,
        slot: &Slot,
        custom_start_time: &str,
        custom_end_time: &str,
        status: ReservationStatus,
        priority: Option<u8>,
    ) -> Self {
        Self {
            student_id: student_id.to_string(),
            slot_id: slot_id.to_string(),
            status,
            slot_date: slot.date,
            slot_start_time: slot.start_time.clone(),
            slot_end_time: slot.end_time.clone(),
            slot_training_type: slot.training_type,
            custom_start_time: custom_start_time.to_string(),
            custom_end_time: custom_end_time.to_string(),
            priority,
            is_first_day: false,
            check_in_time: None,
            check_out_time: None,
            actual_minutes: None,
            cancelled_at: None,
            cancelled_by: None,
        }
    }

    /// The booked interval in minutes since midnight.
    pub fn interval(&self) -> Result<Interval, DomainError> {
        Ok(Interval::new(
            time::parse_minutes(&self.custom_start_time)?,
            time::parse_minutes(&self.custom_end_time)?,
        ))
    }

    /// The wall-clock instant the booking starts, for deadline math.
    pub fn start_datetime(&self) -> Result<NaiveDateTime, DomainError> {
        let minutes = time::parse_minutes(&self.custom_start_time)?;
        let tod = NaiveTime::from_num_seconds_from_midnight_opt(u32::from(minutes) * 60, 0)
            .ok_or_else(|| {
                DomainError::Validation(format!("Invalid time of day: {minutes} minutes"))
            })?;
        Ok(self.slot_date.and_time(tod))
    }

    /// The availability-cache entry this reservation projects to.
    pub fn cache_entry(&self, reservation_id: &str) -> CacheEntry {
        CacheEntry {
            start: self.custom_start_time.clone(),
            end: self.custom_end_time.clone(),
            status: self.status,
            reservation_id: reservation_id.to_string(),
        }
    }
}

/// Total credited minutes for a student: the sum of `actual_minutes` over
/// completed reservations. Always derived, never stored, so it cannot
/// drift.
pub fn credited_minutes<'a>(reservations: impl IntoIterator<Item = &'a Stored<Reservation>>) -> u32 {
    reservations
        .into_iter()
        .filter(|r| r.data.status == ReservationStatus::Completed)
        .map(|r| u32::from(r.data.actual_minutes.unwrap_or(0)))
        .sum()
}
