//! HTTP route handlers.

pub mod health;
pub mod intent;
pub mod invoke;
pub mod metrics;
pub mod orders;
