//! Authentication API
//!
//! | 路径 | 方法 | 认证 |
//! |------|------|------|
//! | /api/auth/login | POST | 无 |
//! | /api/auth/register | POST | 无 |
//! | /api/auth/refresh | POST | 无 |
//! | /api/auth/logout | POST | 无 |
//! | /api/auth/forgot-password | POST | 无 |
//! | /api/auth/me | GET | 需要 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/register", post(handler::register))
        .route("/refresh", post(handler::refresh))
        .route("/logout", post(handler::logout))
        .route("/forgot-password", post(handler::forgot_password))
        .route("/me", get(handler::me))
}
