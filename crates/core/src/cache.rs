//! Availability-cache entries and their maintenance rules.
//!
//! Each slot carries a denormalized, ordered list of `{start, end, status,
//! reservation_id}` entries summarizing its non-cancelled reservations. The
//! list is a materialized view: always re-derivable from the reservation
//! records, incrementally patched on every state change, and overwritten
//! wholesale by the repair tool. Keeping the ordering and membership rules
//! in one place is what lets `rebuild == stored` hold as an invariant.

use serde::{Deserialize, Serialize};

use crate::reservation::ReservationStatus;

/// One cached reservation interval. Times are `HH:MM` strings, matching
/// the persisted slot shape; lexicographic order on them is chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub start: String,
    pub end: String,
    pub status: ReservationStatus,
    pub reservation_id: String,
}

/// Outcome of [`upsert_entry`], so callers can log the recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// An existing entry for the reservation was patched in place.
    Patched,
    /// No entry was found; the entry was inserted. When the caller expected
    /// one to exist this is the `InconsistentCacheState` recovery path.
    Inserted,
}

/// Canonical ordering: by start time, then reservation id as tie-break.
fn entry_key(entry: &CacheEntry) -> (String, String) {
    (entry.start.clone(), entry.reservation_id.clone())
}

/// Insert or patch the entry for a reservation, keeping the list ordered.
///
/// If an entry with the same `reservation_id` exists it is replaced in
/// place (status and interval alike); otherwise the entry is inserted at
/// its ordered position. Never fails: a missing expected entry degrades to
/// an insert rather than aborting the surrounding transaction.
pub fn upsert_entry(cache: &mut Vec<CacheEntry>, entry: CacheEntry) -> UpsertOutcome {
    if let Some(existing) = cache
        .iter_mut()
        .find(|e| e.reservation_id == entry.reservation_id)
    {
        *existing = entry;
        cache.sort_by_key(entry_key);
        UpsertOutcome::Patched
    } else {
        cache.push(entry);
        cache.sort_by_key(entry_key);
        UpsertOutcome::Inserted
    }
}

/// Remove the entry for a reservation. Returns whether one was present;
/// callers log a missing entry but do not fail the transaction.
pub fn remove_entry(cache: &mut Vec<CacheEntry>, reservation_id: &str) -> bool {
    let before = cache.len();
    cache.retain(|e| e.reservation_id != reservation_id);
    cache.len() != before
}

/// Produce the canonical cache contents from a set of candidate entries:
/// cancelled reservations dropped, ordered by start time then reservation
/// id. This is the projection both the incremental path and the full
/// rebuild converge on.
pub fn project(entries: impl IntoIterator<Item = CacheEntry>) -> Vec<CacheEntry> {
    let mut cache: Vec<CacheEntry> = entries
        .into_iter()
        .filter(|e| e.status.is_cached())
        .collect();
    cache.sort_by_key(entry_key);
    cache
}
