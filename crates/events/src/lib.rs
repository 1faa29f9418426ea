//! Event system for the replication engine.
//!
//! This crate provides the event bus and event types used to observe
//! run lifecycle changes from other components.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
