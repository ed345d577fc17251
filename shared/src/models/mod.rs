//! Data models
//!
//! Shared between hr-server and API clients. JSON is camelCase.
//! Plain rows use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`; rows with status
//! enums are mapped by hand in the server (`as_db` / `from_db`).
//! All IDs are UUID v4 strings, all timestamps UTC epoch milliseconds.

pub mod attendance;
pub mod department;
pub mod leave;
pub mod performance;
pub mod recruitment;
pub mod role;
pub mod time_entry;
pub mod user;

// Re-exports
pub use attendance::*;
pub use department::*;
pub use leave::*;
pub use performance::*;
pub use recruitment::*;
pub use role::*;
pub use time_entry::*;
pub use user::*;
