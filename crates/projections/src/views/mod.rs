//! Read model views built from order events.

pub mod orders_by_item;

pub use orders_by_item::OrdersByItemView;
