//! Attendance API Module
//!
//! Clock-in/out and breaks act on the caller's own day. Time tracking lives
//! under `/api/attendance/time-tracking` and is scoped to the caller.

mod handler;
mod time_tracking;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::AppState;
use crate::auth::{Permission, require_permission};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/attendance", routes())
}

fn routes() -> Router<AppState> {
    let clock_routes = Router::new()
        .route("/clock-in", post(handler::clock_in))
        .route("/clock-out", post(handler::clock_out))
        .route("/break-start", post(handler::start_break))
        .route("/break-end", post(handler::end_break));

    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/today", get(handler::today))
        .layer(middleware::from_fn(require_permission(Permission::AttendanceRead)));

    // 本人或 attendance.read (handler 内检查)
    let user_routes = Router::new()
        .route("/user/{id}", get(handler::user_records))
        .route("/user/{id}/summary", get(handler::user_summary));

    let time_routes = Router::new()
        .route(
            "/time-tracking",
            post(time_tracking::create).get(time_tracking::list),
        )
        .route(
            "/time-tracking/{id}",
            get(time_tracking::get_by_id)
                .put(time_tracking::update)
                .delete(time_tracking::delete),
        );

    clock_routes
        .merge(read_routes)
        .merge(user_routes)
        .merge(time_routes)
}

