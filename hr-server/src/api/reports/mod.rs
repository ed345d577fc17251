//! Reports API Module (read-only, `reports.read`)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::AppState;
use crate::auth::{Permission, require_permission};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/reports", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/attendance", get(handler::attendance))
        .route("/leave", get(handler::leave))
        .route("/performance", get(handler::performance))
        .route("/headcount", get(handler::headcount))
        .route("/dashboard/stats", get(handler::dashboard_stats))
        .layer(middleware::from_fn(require_permission(Permission::ReportsRead)))
}
