//! Notification requests and the dispatcher seam.
//!
//! The core only *emits* notification requests; delivery is an external
//! collaborator and best-effort. A failed dispatch is logged and never
//! rolls back the committed operation that produced it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

/// A delivery request handed to the external dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationDeliveryFailed(pub String);

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, request: NotificationRequest)
        -> Result<(), NotificationDeliveryFailed>;
}

/// Default dispatcher: logs the request. Deployments plug a real mail
/// sender in behind the same trait.
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(
        &self,
        request: NotificationRequest,
    ) -> Result<(), NotificationDeliveryFailed> {
        tracing::info!(to = %request.to, subject = %request.subject, "Notification requested");
        Ok(())
    }
}

/// Test dispatcher: records every request, optionally failing each
/// dispatch to exercise the fire-and-forget policy.
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<NotificationRequest>>,
    fail: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose every dispatch fails (after recording).
    pub fn failing() -> Self {
        let dispatcher = Self::default();
        dispatcher.fail.store(true, Ordering::SeqCst);
        dispatcher
    }

    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().expect("dispatcher mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        request: NotificationRequest,
    ) -> Result<(), NotificationDeliveryFailed> {
        let to = request.to.clone();
        self.sent
            .lock()
            .expect("dispatcher mutex poisoned")
            .push(request);
        if self.fail.load(Ordering::SeqCst) {
            Err(NotificationDeliveryFailed(format!("simulated failure for {to}")))
        } else {
            Ok(())
        }
    }
}
