//! Repository for the `reservations` collection.

use practicum_core::reservation::ReservationStatus;
use uuid::Uuid;

use crate::models::collections::RESERVATIONS;
use crate::models::reservation::{credited_minutes, Reservation};
use crate::store::{DocumentStore, StoreError, Stored, WriteBatch};

/// Provides read and create operations for reservations. State
/// transitions pair a reservation write with its slot's cache write and
/// therefore live in the operation layer's transactions.
pub struct ReservationRepo;

impl ReservationRepo {
    /// Allocate a fresh reservation id. Exposed so transactional creation
    /// in the operation layer can stage the document itself.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Insert a reservation under a fresh id, outside any transaction.
    pub async fn create(
        store: &dyn DocumentStore,
        reservation: Reservation,
    ) -> Result<Stored<Reservation>, StoreError> {
        let id = Self::new_id();
        let mut batch = WriteBatch::new();
        batch.set(RESERVATIONS, &id, &reservation)?;
        store.apply_batch(batch).await?;
        Ok(Stored {
            id,
            version: 0,
            data: reservation,
        })
    }

    /// Find a reservation by its id.
    pub async fn find_by_id(
        store: &dyn DocumentStore,
        id: &str,
    ) -> Result<Option<Stored<Reservation>>, StoreError> {
        match store.get(RESERVATIONS, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// List every reservation, in id order.
    pub async fn list_all(
        store: &dyn DocumentStore,
    ) -> Result<Vec<Stored<Reservation>>, StoreError> {
        store
            .list(RESERVATIONS)
            .await?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// List every reservation referencing a slot.
    pub async fn list_by_slot(
        store: &dyn DocumentStore,
        slot_id: &str,
    ) -> Result<Vec<Stored<Reservation>>, StoreError> {
        Ok(Self::list_all(store)
            .await?
            .into_iter()
            .filter(|r| r.data.slot_id == slot_id)
            .collect())
    }

    /// List a student's reservations.
    pub async fn list_by_student(
        store: &dyn DocumentStore,
        student_id: &str,
    ) -> Result<Vec<Stored<Reservation>>, StoreError> {
        Ok(Self::list_all(store)
            .await?
            .into_iter()
            .filter(|r| r.data.student_id == student_id)
            .collect())
    }

    /// List all pending lottery applications.
    pub async fn list_applied(
        store: &dyn DocumentStore,
    ) -> Result<Vec<Stored<Reservation>>, StoreError> {
        Ok(Self::list_all(store)
            .await?
            .into_iter()
            .filter(|r| r.data.status == ReservationStatus::Applied)
            .collect())
    }

    /// A student's non-cancelled reservation on a slot, if any. Backs the
    /// one-reservation-per-slot constraint.
    pub async fn find_active_for_student_slot(
        store: &dyn DocumentStore,
        student_id: &str,
        slot_id: &str,
    ) -> Result<Option<Stored<Reservation>>, StoreError> {
        Ok(Self::list_by_student(store, student_id)
            .await?
            .into_iter()
            .find(|r| {
                r.data.slot_id == slot_id && r.data.status != ReservationStatus::Cancelled
            }))
    }

    /// Whether a student already holds an `applied` reservation at the
    /// given priority rank.
    pub async fn has_application_at_priority(
        store: &dyn DocumentStore,
        student_id: &str,
        priority: u8,
    ) -> Result<bool, StoreError> {
        Ok(Self::list_by_student(store, student_id)
            .await?
            .iter()
            .any(|r| {
                r.data.status == ReservationStatus::Applied && r.data.priority == Some(priority)
            }))
    }

    /// Total credited minutes for a student, derived on demand.
    pub async fn credited_minutes_for_student(
        store: &dyn DocumentStore,
        student_id: &str,
    ) -> Result<u32, StoreError> {
        let reservations = Self::list_by_student(store, student_id).await?;
        Ok(credited_minutes(&reservations))
    }
}
