//! Operation layer for the practicum slot-allocation system.
//!
//! Every user-facing operation is a short-lived unit of work over an
//! explicit [`context::AppContext`]; nothing here reaches into ambient
//! globals. Reservation writes and their slot's availability-cache writes
//! always share one store transaction, so the cache can only drift through
//! paths the repair tool exists to fix.

pub mod booking;
pub mod config;
pub mod context;
pub mod error;
pub mod lottery;
pub mod notify;
pub mod repair;
pub mod slots;

pub use booking::BookingService;
pub use context::AppContext;
pub use error::{OpError, OpResult};
pub use lottery::LotteryService;
pub use repair::RepairService;
pub use slots::SlotService;
