//! Domain error taxonomy.
//!
//! Business-rule violations are typed so callers can tell the user which
//! rule was broken (capacity vs. cancellation window vs. duplicate
//! priority) instead of surfacing a generic failure.

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// A direct-mode booking would exceed the slot's concurrent capacity at
    /// some instant. Carries the configured capacity so the rejection can
    /// quote the same number the slot was created with.
    #[error("Slot capacity of {max_capacity} would be exceeded")]
    CapacityExceeded { max_capacity: u32 },

    /// The student already holds an active application at this priority rank.
    #[error("An application with priority {priority} already exists")]
    PriorityAlreadyTaken { priority: u8 },

    /// Student-initiated cancellation attempted inside the protected window.
    #[error("The cancellation window has closed; contact an administrator")]
    CancellationWindowClosed,

    /// A referenced document vanished between read and write.
    #[error("Entity not found: {entity} with id {id}")]
    RecordNotFound { entity: &'static str, id: String },

    /// An incremental cache update could not locate the expected entry.
    /// Recovered internally by falling back to an insert; this variant only
    /// exists so the recovery path can be logged with a typed cause.
    #[error("Availability cache entry missing for reservation {reservation_id}")]
    InconsistentCacheState { reservation_id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}
