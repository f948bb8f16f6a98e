//! Administrative slot operations.

use practicum_core::{time, DomainError};
use practicum_db::models::collections::SLOTS;
use practicum_db::models::slot::{CreateSlot, CreateSlotBatch, Slot, UpdateSlot};
use practicum_db::repositories::SlotRepo;
use practicum_db::store::txn_set;
use practicum_db::Stored;

use crate::booking::get_slot_txn;
use crate::context::AppContext;
use crate::error::{OpError, OpResult};

/// Provides slot creation, editing and deletion. All admin-only; the
/// operation layer assumes the caller has already authenticated the actor.
pub struct SlotService;

impl SlotService {
    /// Create one slot.
    pub async fn create(ctx: &AppContext, payload: CreateSlot) -> OpResult<Stored<Slot>> {
        payload.check()?;
        Ok(SlotRepo::create(ctx.store.as_ref(), payload.into_slot()).await?)
    }

    /// Templated batch creation: one slot per date, all landing in a
    /// single atomic batch.
    pub async fn create_batch(ctx: &AppContext, batch: CreateSlotBatch) -> OpResult<Vec<String>> {
        if batch.dates.is_empty() {
            return Err(DomainError::Validation("No dates given".to_string()).into());
        }
        let templates = batch.templates();
        for template in &templates {
            template.check()?;
        }
        let slots = templates.into_iter().map(CreateSlot::into_slot).collect();
        let ids = SlotRepo::create_batch(ctx.store.as_ref(), slots).await?;
        tracing::info!(count = ids.len(), "Slot batch created");
        Ok(ids)
    }

    /// Edit a slot's fixed bounds, capacity, or active flag.
    ///
    /// Edits do not cascade to the denormalized snapshot fields on
    /// existing reservations; those record the slot as it was when booked.
    pub async fn update(ctx: &AppContext, slot_id: &str, update: UpdateSlot) -> OpResult<()> {
        let mut txn = ctx.store.begin().await?;
        let mut slot = get_slot_txn(txn.as_mut(), slot_id).await?;

        if let Some(start_time) = update.start_time {
            time::parse_minutes(&start_time)?;
            slot.start_time = start_time;
        }
        if let Some(end_time) = update.end_time {
            time::parse_minutes(&end_time)?;
            slot.end_time = end_time;
        }
        let (start, end) = slot.bounds_minutes()?;
        if start >= end {
            return Err(DomainError::Validation(format!(
                "Slot bounds are inverted or empty: {} >= {}",
                slot.start_time, slot.end_time
            ))
            .into());
        }
        if let Some(max_capacity) = update.max_capacity {
            if max_capacity == 0 {
                return Err(
                    DomainError::Validation("max_capacity must be at least 1".to_string()).into(),
                );
            }
            slot.max_capacity = max_capacity;
        }
        if let Some(is_active) = update.is_active {
            slot.is_active = is_active;
        }

        txn_set(txn.as_mut(), SLOTS, slot_id, &slot)?;
        txn.commit().await?;
        Ok(())
    }

    /// Delete a slot. Refused while any active (applied or confirmed)
    /// reservation references it; the transaction's read validation also
    /// fails the delete if a booking lands concurrently.
    pub async fn delete(ctx: &AppContext, slot_id: &str) -> OpResult<()> {
        let mut txn = ctx.store.begin().await?;
        let slot = get_slot_txn(txn.as_mut(), slot_id).await?;
        if slot.has_active_reservations() {
            return Err(OpError::Domain(DomainError::Conflict(
                "Slot still has active reservations".to_string(),
            )));
        }
        txn.delete(SLOTS, slot_id);
        txn.commit().await?;

        tracing::info!(slot_id, "Slot deleted");
        Ok(())
    }
}
