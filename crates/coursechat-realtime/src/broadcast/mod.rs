//! Delivery of room events to member connections.

pub mod router;

pub use router::{BroadcastRouter, FanOut};
