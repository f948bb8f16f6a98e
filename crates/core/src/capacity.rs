//! Concurrent-capacity admission check.
//!
//! Reservations claim staggered sub-intervals of the same slot, so "is the
//! slot full" is an interval-overlap question, not a headcount. The check
//! sweeps the breakpoints of the existing intervals inside the candidate
//! range and rejects if any instant is already at capacity.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Half-open `[start, end)` interval in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: u16,
    pub end: u16,
}

impl Interval {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Half-open overlap: `start < other.end && end > other.start`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// An interval is active at instant `t` iff `start <= t < end`.
    pub fn contains_instant(&self, t: u16) -> bool {
        self.start <= t && t < self.end
    }
}

/// Decide whether `candidate` can be admitted against `existing` active
/// intervals without the concurrent count exceeding `max_capacity` at any
/// instant.
///
/// Callers pass only intervals that count for live capacity (non-cancelled,
/// non-completed); the candidate itself spans the whole checked range, so
/// admission requires strictly fewer than `max_capacity` existing intervals
/// active at every breakpoint.
///
/// Pure decision: no side effects. While lottery mode applies to a slot
/// this check is skipped entirely and capacity is enforced at resolution
/// time instead.
pub fn check_capacity(
    existing: &[Interval],
    candidate: Interval,
    max_capacity: u32,
) -> Result<(), DomainError> {
    if candidate.start >= candidate.end {
        return Err(DomainError::Validation(format!(
            "Empty booking interval: [{}, {})",
            candidate.start, candidate.end
        )));
    }

    let overlapping: Vec<&Interval> =
        existing.iter().filter(|iv| iv.overlaps(&candidate)).collect();
    if overlapping.is_empty() {
        return Ok(());
    }

    // Breakpoints: the candidate's start plus every overlapping endpoint
    // strictly inside the candidate range. The concurrent count is constant
    // between breakpoints, so checking only these instants is exhaustive.
    let mut breakpoints: Vec<u16> = vec![candidate.start];
    for iv in &overlapping {
        for t in [iv.start, iv.end] {
            if t > candidate.start && t < candidate.end {
                breakpoints.push(t);
            }
        }
    }
    breakpoints.sort_unstable();
    breakpoints.dedup();

    for t in breakpoints {
        let active = overlapping.iter().filter(|iv| iv.contains_instant(t)).count();
        if active as u32 >= max_capacity {
            return Err(DomainError::CapacityExceeded { max_capacity });
        }
    }
    Ok(())
}
