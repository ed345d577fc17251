//! Shared types for the HR backend
//!
//! Common types used by the server and its clients: the error system and
//! response envelope, wire models, pagination, and small utilities.

pub mod error;
pub mod models;
pub mod query;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use query::{PageQuery, PaginatedResponse};
