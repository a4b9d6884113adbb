//! Convenience result type alias for CourseChat.

use crate::error::AppError;

/// A specialized `Result` type for CourseChat operations.
pub type AppResult<T> = Result<T, AppError>;
