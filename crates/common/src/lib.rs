//! Shared types used across the order-patterns workspace.

mod types;

pub use types::AggregateId;
