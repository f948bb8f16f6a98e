//! Pure domain logic for the practicum slot-allocation core.
//!
//! This crate has zero internal dependencies so it can be used by the
//! persistence layer, the operation layer, and any future CLI tooling.
//! Nothing in here touches a store or a clock: every function is a pure
//! decision over values handed to it.

pub mod cache;
pub mod capacity;
pub mod error;
pub mod lottery;
pub mod reservation;
pub mod time;
pub mod types;

pub use error::DomainError;
