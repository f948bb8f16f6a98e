//! Persisted document models and their create payloads.

pub mod reservation;
pub mod slot;
pub mod student;

/// Collection names used across the store.
pub mod collections {
    pub const SLOTS: &str = "slots";
    pub const RESERVATIONS: &str = "reservations";
    pub const STUDENTS: &str = "students";
}
