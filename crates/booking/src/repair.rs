//! Out-of-band consistency utilities.
//!
//! Both operations are idempotent and safe to run at any time, including
//! mid-abandonment: they persist nothing beyond what each per-document
//! transaction already committed.

use std::collections::HashMap;
use std::sync::Arc;

use practicum_core::cache::{self, CacheEntry};
use practicum_db::models::collections::{RESERVATIONS, SLOTS};
use practicum_db::models::reservation::Reservation;
use practicum_db::models::slot::Slot;
use practicum_db::repositories::{ReservationRepo, SlotRepo, StudentRepo};
use practicum_db::store::{txn_set, with_retries, DocumentStore, StoreError};

use crate::context::AppContext;
use crate::error::OpResult;

/// Counts reported by a cache rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildSummary {
    /// Slots processed (every slot, drifted or not).
    pub slots: usize,
    /// Slots whose stored cache disagreed with the projection.
    pub repaired: usize,
}

/// Counts reported by the legacy re-keying migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RekeySummary {
    /// Reservations still keyed by e-mail address when the run started.
    pub legacy: usize,
    /// Reservations re-keyed onto a canonical student id.
    pub rekeyed: usize,
    /// Legacy addresses with no matching student record.
    pub unmatched: usize,
}

/// Provides the repair operations.
pub struct RepairService;

impl RepairService {
    /// Recompute every slot's availability cache from the reservation
    /// records and overwrite the stored cache unconditionally.
    ///
    /// Processes slots with zero reservations too, setting their cache to
    /// empty. Each slot is written in its own retried transaction, so a
    /// concurrent booking on one slot cannot fail the whole run.
    pub async fn rebuild_availability_caches(ctx: &AppContext) -> OpResult<RebuildSummary> {
        let store = ctx.store.as_ref();
        let reservations = ReservationRepo::list_all(store).await?;
        let slots = SlotRepo::list_all(store).await?;

        let mut entries_by_slot: HashMap<&str, Vec<CacheEntry>> = HashMap::new();
        for r in &reservations {
            entries_by_slot
                .entry(r.data.slot_id.as_str())
                .or_default()
                .push(r.data.cache_entry(&r.id));
        }

        let mut summary = RebuildSummary::default();
        for slot in &slots {
            let expected = cache::project(
                entries_by_slot.get(slot.id.as_str()).cloned().unwrap_or_default(),
            );
            let repaired = with_retries(ctx.config.txn_retry_limit, || {
                Self::rewrite_slot_cache(Arc::clone(&ctx.store), slot.id.clone(), expected.clone())
            })
            .await?;
            summary.slots += 1;
            if repaired {
                summary.repaired += 1;
                tracing::info!(slot_id = %slot.id, "Availability cache repaired");
            }
        }

        tracing::info!(
            slots = summary.slots,
            repaired = summary.repaired,
            "Cache rebuild finished"
        );
        Ok(summary)
    }

    /// Overwrite one slot's cache if it differs from the projection.
    /// Returns whether a repair write was needed.
    async fn rewrite_slot_cache(
        store: Arc<dyn DocumentStore>,
        slot_id: String,
        expected: Vec<CacheEntry>,
    ) -> Result<bool, StoreError> {
        let mut txn = store.begin().await?;
        let Some(doc) = txn.get(SLOTS, &slot_id).await? else {
            // Deleted since the scan; nothing to repair.
            return Ok(false);
        };
        let mut slot = doc.decode::<Slot>()?.data;
        if slot.availability_cache == expected {
            return Ok(false);
        }
        slot.availability_cache = expected;
        txn_set(txn.as_mut(), SLOTS, &slot_id, &slot)?;
        txn.commit().await?;
        Ok(true)
    }

    /// Re-key legacy reservations that reference their student by e-mail
    /// address onto the canonical student document id.
    ///
    /// Idempotent: canonical records are skipped, and a repeated run finds
    /// nothing left to do. Unmatched addresses are reported, never deleted.
    pub async fn rekey_legacy_reservations(ctx: &AppContext) -> OpResult<RekeySummary> {
        let store = ctx.store.as_ref();
        let reservations = ReservationRepo::list_all(store).await?;
        let students = StudentRepo::list_all(store).await?;
        let by_email: HashMap<&str, &str> = students
            .iter()
            .map(|s| (s.data.email.as_str(), s.id.as_str()))
            .collect();

        let mut summary = RekeySummary::default();
        for r in &reservations {
            // Legacy records carry the address where the id belongs.
            if !r.data.student_id.contains('@') {
                continue;
            }
            summary.legacy += 1;
            match by_email.get(r.data.student_id.as_str()) {
                Some(student_id) => {
                    with_retries(ctx.config.txn_retry_limit, || {
                        Self::rekey_one(
                            Arc::clone(&ctx.store),
                            r.id.clone(),
                            (*student_id).to_string(),
                        )
                    })
                    .await?;
                    summary.rekeyed += 1;
                }
                None => {
                    summary.unmatched += 1;
                    tracing::warn!(
                        reservation_id = %r.id,
                        email = %r.data.student_id,
                        "No student record for legacy address"
                    );
                }
            }
        }

        tracing::info!(
            legacy = summary.legacy,
            rekeyed = summary.rekeyed,
            unmatched = summary.unmatched,
            "Legacy re-keying finished"
        );
        Ok(summary)
    }

    async fn rekey_one(
        store: Arc<dyn DocumentStore>,
        reservation_id: String,
        student_id: String,
    ) -> Result<(), StoreError> {
        let mut txn = store.begin().await?;
        let Some(doc) = txn.get(RESERVATIONS, &reservation_id).await? else {
            return Ok(());
        };
        let mut reservation = doc.decode::<Reservation>()?.data;
        if !reservation.student_id.contains('@') {
            // Already re-keyed by a concurrent or earlier run.
            return Ok(());
        }
        reservation.student_id = student_id;
        txn_set(txn.as_mut(), RESERVATIONS, &reservation_id, &reservation)?;
        txn.commit().await
    }
}
