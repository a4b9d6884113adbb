//! Room presence counts.

pub mod aggregator;

pub use aggregator::PresenceAggregator;
