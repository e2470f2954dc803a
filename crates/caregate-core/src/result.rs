//! Convenience result type alias for CareGate.

use crate::error::AppError;

/// A specialized `Result` type for CareGate operations.
pub type AppResult<T> = Result<T, AppError>;
