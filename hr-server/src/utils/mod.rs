//! Utility helpers

pub mod serde_helpers;
pub mod time;
pub mod validation;

pub use shared::{AppError, AppResult};
