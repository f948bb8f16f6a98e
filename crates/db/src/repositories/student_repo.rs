//! Repository for the `students` collection.

use uuid::Uuid;

use crate::models::collections::STUDENTS;
use crate::models::student::Student;
use crate::store::{DocumentStore, StoreError, Stored, WriteBatch};

/// Provides read and create operations for students.
pub struct StudentRepo;

impl StudentRepo {
    /// Insert a new student under a fresh id.
    pub async fn create(
        store: &dyn DocumentStore,
        student: Student,
    ) -> Result<Stored<Student>, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut batch = WriteBatch::new();
        batch.set(STUDENTS, &id, &student)?;
        store.apply_batch(batch).await?;
        Ok(Stored {
            id,
            version: 0,
            data: student,
        })
    }

    /// Find a student by id.
    pub async fn find_by_id(
        store: &dyn DocumentStore,
        id: &str,
    ) -> Result<Option<Stored<Student>>, StoreError> {
        match store.get(STUDENTS, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// List every student, in id order.
    pub async fn list_all(store: &dyn DocumentStore) -> Result<Vec<Stored<Student>>, StoreError> {
        store
            .list(STUDENTS)
            .await?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Find a student by e-mail address. Used by the legacy re-keying
    /// migration, where old reservations reference students by address.
    pub async fn find_by_email(
        store: &dyn DocumentStore,
        email: &str,
    ) -> Result<Option<Stored<Student>>, StoreError> {
        Ok(Self::list_all(store)
            .await?
            .into_iter()
            .find(|s| s.data.email == email))
    }
}
