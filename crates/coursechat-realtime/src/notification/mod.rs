//! Per-user notifications.

pub mod dispatcher;
pub mod formatter;

pub use dispatcher::{NotificationDispatcher, Routed};
