//! Repository for the `slots` collection.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::collections::SLOTS;
use crate::models::slot::Slot;
use crate::store::{DocumentStore, StoreError, Stored, WriteBatch};

/// Provides read and create operations for slots. Mutations that must stay
/// consistent with reservation writes go through transactions in the
/// operation layer, not through here.
pub struct SlotRepo;

impl SlotRepo {
    /// Insert a new slot under a fresh id, returning the stored form.
    pub async fn create(
        store: &dyn DocumentStore,
        slot: Slot,
    ) -> Result<Stored<Slot>, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut batch = WriteBatch::new();
        batch.set(SLOTS, &id, &slot)?;
        store.apply_batch(batch).await?;
        Ok(Stored {
            id,
            version: 0,
            data: slot,
        })
    }

    /// Insert several slots in one atomic batch (templated creation).
    pub async fn create_batch(
        store: &dyn DocumentStore,
        slots: Vec<Slot>,
    ) -> Result<Vec<String>, StoreError> {
        let mut batch = WriteBatch::new();
        let mut ids = Vec::with_capacity(slots.len());
        for slot in &slots {
            let id = Uuid::new_v4().to_string();
            batch.set(SLOTS, &id, slot)?;
            ids.push(id);
        }
        store.apply_batch(batch).await?;
        Ok(ids)
    }

    /// Find a slot by its id.
    pub async fn find_by_id(
        store: &dyn DocumentStore,
        id: &str,
    ) -> Result<Option<Stored<Slot>>, StoreError> {
        match store.get(SLOTS, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// List every slot, in id order.
    pub async fn list_all(store: &dyn DocumentStore) -> Result<Vec<Stored<Slot>>, StoreError> {
        store
            .list(SLOTS)
            .await?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// List active slots on a given date.
    pub async fn list_active_on(
        store: &dyn DocumentStore,
        date: NaiveDate,
    ) -> Result<Vec<Stored<Slot>>, StoreError> {
        Ok(Self::list_all(store)
            .await?
            .into_iter()
            .filter(|s| s.data.is_active && s.data.date == date)
            .collect())
    }

    /// Overwrite a slot body outside any transaction. Reserved for edits
    /// that touch no reservation state.
    pub async fn put(
        store: &dyn DocumentStore,
        id: &str,
        slot: &Slot,
    ) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.set(SLOTS, id, slot)?;
        store.apply_batch(batch).await
    }

    /// Delete a slot document. The zero-active-reservations guard lives in
    /// the operation layer.
    pub async fn delete(store: &dyn DocumentStore, id: &str) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.delete(SLOTS, id);
        store.apply_batch(batch).await
    }
}
