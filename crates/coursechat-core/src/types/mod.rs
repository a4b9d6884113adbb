//! Core type definitions used across the CourseChat workspace.

pub mod chat;
pub mod id;
pub mod role;

pub use chat::{ChatMessage, Identity, NotificationEvent, NotificationKind};
pub use id::*;
pub use role::UserRole;
