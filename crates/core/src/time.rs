//! Wall-clock arithmetic for slot intervals.
//!
//! Times of day are `HH:MM` strings at the boundary and integer minutes
//! since midnight everywhere else; no floating point, no timezones. The
//! candidate start/end enumeration implements the fixed quantization
//! policy: bookings begin at one of the canonical period offsets, last at
//! least [`MIN_DURATION_MINUTES`], and end on a 10-minute mark.

use crate::error::DomainError;

/// Canonical period start offsets, in minutes since midnight
/// (08:30, 11:00, 13:20, 15:00, 16:40, 18:20).
pub const CANONICAL_START_MINUTES: &[u16] = &[510, 660, 800, 900, 1000, 1100];

/// Minimum booking duration in minutes.
pub const MIN_DURATION_MINUTES: u16 = 120;

/// Granularity of candidate end times, in minutes.
pub const END_STEP_MINUTES: u16 = 10;

/// Parse an `HH:MM` or `HH:MM:SS` string into minutes since midnight.
///
/// Seconds are accepted (some legacy records carry them) but discarded.
pub fn parse_minutes(value: &str) -> Result<u16, DomainError> {
    let invalid = || DomainError::Validation(format!("Invalid time of day: '{value}'"));

    let mut parts = value.split(':');
    let hours: u16 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    let minutes: u16 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    if let Some(seconds) = parts.next() {
        if seconds.parse::<u16>().map_err(|_| invalid())? > 59 {
            return Err(invalid());
        }
    }
    if parts.next().is_some() || hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

/// Format minutes since midnight as `HH:MM`.
pub fn format_minutes(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Enumerate the valid booking start times for a slot spanning
/// `[slot_start, slot_end)` in minutes.
///
/// A canonical offset is valid iff it lies within the slot bounds and
/// leaves at least [`MIN_DURATION_MINUTES`] before the slot end. A slot
/// that admits no start simply yields an empty list; callers must treat
/// that as "no bookable interval", not as an error.
pub fn valid_start_minutes(slot_start: u16, slot_end: u16) -> Vec<u16> {
    CANONICAL_START_MINUTES
        .iter()
        .copied()
        .filter(|&start| start >= slot_start && start + MIN_DURATION_MINUTES <= slot_end)
        .collect()
}

/// Enumerate the valid end times for a booking starting at `start` within
/// a slot ending at `slot_end`: every 10-minute mark from
/// `start + MIN_DURATION_MINUTES` up to `slot_end`, inclusive.
pub fn valid_end_minutes(start: u16, slot_end: u16) -> Vec<u16> {
    let earliest = start + MIN_DURATION_MINUTES;
    if earliest > slot_end {
        return Vec::new();
    }
    // First 10-minute mark at or after the earliest permissible end.
    let first = earliest.div_ceil(END_STEP_MINUTES) * END_STEP_MINUTES;
    (first..=slot_end)
        .step_by(END_STEP_MINUTES as usize)
        .collect()
}

/// Duration in minutes of a half-open `[start, end)` interval.
pub fn duration_minutes(start: u16, end: u16) -> u16 {
    end.saturating_sub(start)
}
