//! Reservation lifecycle: statuses, the transition table, and the
//! time-based business rules attached to transitions.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle status of a reservation.
///
/// `Applied` exists only under lottery mode (a pending pick); direct-mode
/// bookings are created straight into `Confirmed`. `Completed` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Applied,
    Confirmed,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    /// Statuses that occupy capacity for live booking decisions.
    ///
    /// `Completed` reservations keep their cache entry for display but are
    /// excluded here alongside `Cancelled`: a finished attendance no longer
    /// contends with new bookings.
    pub fn counts_for_capacity(&self) -> bool {
        matches!(self, ReservationStatus::Applied | ReservationStatus::Confirmed)
    }

    /// Statuses projected into the slot's availability cache.
    pub fn is_cached(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }

    /// Non-terminal statuses block slot deletion and count as "active"
    /// for the one-reservation-per-slot constraint.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Applied | ReservationStatus::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Applied => "applied",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who cancelled a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    Student,
    Admin,
}

/// Returns the set of valid target statuses reachable from `from`.
///
/// Terminal states return an empty slice. The `completed` record's
/// `actual_minutes` correction is an attribute edit, not a transition.
pub fn valid_transitions(from: ReservationStatus) -> &'static [ReservationStatus] {
    use ReservationStatus::*;
    match from {
        Applied => &[Confirmed, Cancelled],
        Confirmed => &[Completed, Cancelled],
        Completed | Cancelled => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: ReservationStatus, to: ReservationStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a transition, returning a typed conflict for invalid ones.
pub fn validate_transition(
    from: ReservationStatus,
    to: ReservationStatus,
) -> Result<(), DomainError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(DomainError::Conflict(format!(
            "Invalid reservation transition: {from} -> {to}"
        )))
    }
}

/// Decide whether a *student* may still cancel a reservation starting at
/// `reservation_start`, given the current wall-clock time and the
/// configured cutoff.
///
/// The window is open iff strictly more than `cutoff_hours` remain before
/// the reservation's own start; exactly at the cutoff the window is
/// closed. Administrators bypass this check entirely.
pub fn check_cancellation_window(
    now: NaiveDateTime,
    reservation_start: NaiveDateTime,
    cutoff_hours: i64,
) -> Result<(), DomainError> {
    if reservation_start - now > TimeDelta::hours(cutoff_hours) {
        Ok(())
    } else {
        Err(DomainError::CancellationWindowClosed)
    }
}

/// Decide whether a slot starting at `slot_start` is still bookable, given
/// the advance-booking visibility rule (`lead_hours` ahead, default 12).
pub fn is_bookable(now: NaiveDateTime, slot_start: NaiveDateTime, lead_hours: i64) -> bool {
    slot_start - now > TimeDelta::hours(lead_hours)
}

/// Derive the credited minutes for a completing reservation.
///
/// Precedence: an explicit override from the approving admin, else the
/// recorded check-in/check-out pair, else the nominal booked interval.
pub fn derive_actual_minutes(
    explicit: Option<u16>,
    check_in: Option<u16>,
    check_out: Option<u16>,
    custom_start: u16,
    custom_end: u16,
) -> u16 {
    if let Some(minutes) = explicit {
        return minutes;
    }
    if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
        if check_out > check_in {
            return check_out - check_in;
        }
    }
    custom_end.saturating_sub(custom_start)
}
