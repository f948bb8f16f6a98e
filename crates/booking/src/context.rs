//! Explicit operation context.
//!
//! The original system kept store and auth handles in module-scoped
//! globals; here every operation receives an [`AppContext`] instead, which
//! is also what makes the clock and the notification dispatcher swappable
//! in tests.

use std::sync::Arc;

use chrono::NaiveDateTime;
use practicum_db::DocumentStore;

use crate::config::BookingConfig;
use crate::notify::NotificationDispatcher;

/// Wall-clock seam. Business deadlines (cancellation cutoff, advance
/// booking) are computed from this, never from `now()` calls scattered
/// through the services.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Production clock: local wall time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Test clock pinned to a fixed instant.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Handles shared by every operation.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn DocumentStore>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub clock: Arc<dyn Clock>,
    pub config: BookingConfig,
}

impl AppContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
        }
    }
}
