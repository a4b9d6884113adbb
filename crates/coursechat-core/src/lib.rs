//! # coursechat-core
//!
//! Core crate for CourseChat. Contains configuration schemas, typed
//! identifiers, the chat and notification records exchanged with
//! collaborators, the collaborator traits themselves, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other CourseChat crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
