//! Per-entity repositories over the document store.
//!
//! The store only knows opaque ids and JSON bodies, so all filtering is
//! done here, client-side, after decoding.

pub mod reservation_repo;
pub mod slot_repo;
pub mod student_repo;

pub use reservation_repo::ReservationRepo;
pub use slot_repo::SlotRepo;
pub use student_repo::StudentRepo;
