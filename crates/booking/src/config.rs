//! Operation configuration loaded from environment variables.

/// Business deadlines and retry budget.
///
/// All fields have defaults matching the documented policy; override via
/// environment variables where a deployment needs different windows.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Students may cancel only while strictly more than this many hours
    /// remain before the reservation's start (default: `24`).
    pub cancellation_cutoff_hours: i64,
    /// A slot is bookable only while strictly more than this many hours
    /// remain before the booked start (default: `12`).
    pub booking_lead_hours: i64,
    /// Bounded retry budget for idempotent operations that hit store
    /// conflicts (default: `3`).
    pub txn_retry_limit: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            cancellation_cutoff_hours: 24,
            booking_lead_hours: 12,
            txn_retry_limit: 3,
        }
    }
}

impl BookingConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `CANCELLATION_CUTOFF_HOURS` | `24`    |
    /// | `BOOKING_LEAD_HOURS`        | `12`    |
    /// | `TXN_RETRY_LIMIT`           | `3`     |
    pub fn from_env() -> Self {
        let cancellation_cutoff_hours: i64 = std::env::var("CANCELLATION_CUTOFF_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .expect("CANCELLATION_CUTOFF_HOURS must be a valid i64");

        let booking_lead_hours: i64 = std::env::var("BOOKING_LEAD_HOURS")
            .unwrap_or_else(|_| "12".into())
            .parse()
            .expect("BOOKING_LEAD_HOURS must be a valid i64");

        let txn_retry_limit: u32 = std::env::var("TXN_RETRY_LIMIT")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("TXN_RETRY_LIMIT must be a valid u32");

        Self {
            cancellation_cutoff_hours,
            booking_lead_hours,
            txn_retry_limit,
        }
    }
}
