//! Forkful event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: a committed [`DomainEvent`](forkful_core::activity::DomainEvent)
//!   stamped with the time it was published.
//! - [`ActivityPersistence`]: background subscriber that writes every event
//!   to the `activity_events` table.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, PlatformEvent};
pub use persistence::ActivityPersistence;
