//! Append-only event log.
//!
//! Events are wrapped in [`EventEnvelope`]s and appended per aggregate with
//! optimistic concurrency control. The only backend is [`InMemoryEventStore`];
//! the store is owned by the caller and handed to whatever needs it.

pub mod error;
pub mod event;
pub mod memory;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use store::{AppendOptions, EventStore, EventStream};
