//! HTTP API
//!
//! Every module exposes `router()`; routes live under `/api/<module>`
//! except `/health`.

pub mod attendance;
pub mod auth;
pub mod departments;
pub mod employees;
pub mod health;
pub mod leave;
pub mod performance;
pub mod recruitment;
pub mod reports;

use axum::Router;

use crate::AppState;

/// All routes, without middleware or state
pub fn router() -> Router<AppState> {
    Router::new()
        // Health API - public route
        .merge(health::router())
        // Auth API - login/register/refresh public, /me authenticated
        .merge(auth::router())
        .merge(employees::router())
        .merge(departments::router())
        .merge(attendance::router())
        .merge(leave::router())
        .merge(performance::router())
        .merge(recruitment::router())
        .merge(reports::router())
}
