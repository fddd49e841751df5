//! Projection error types.

use thiserror::Error;

/// Errors that can occur during projection processing.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// Failed to deserialize an event payload.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The event to deliver is not in the store's log.
    #[error("Event {0} is not in the event log")]
    UnknownEvent(event_store::EventId),

    /// A projection rejected an event.
    #[error("Projection {projection} failed: {reason}")]
    Projection {
        projection: &'static str,
        reason: String,
    },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
