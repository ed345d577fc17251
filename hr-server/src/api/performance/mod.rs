//! Performance API Module
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/performance/reviews, /goals | GET | performance.read (列表按权限收窄) |
//! | /api/performance/reviews/{id}, /goals/{id} | GET | 本人或 performance.manage |
//! | /api/performance/goals/user/{userId} | GET | 本人或 performance.manage |
//! | /api/performance/analytics/overview | GET | performance.read |
//! | /api/performance/reviews, /goals (+ /{id}) | POST, PUT, DELETE | performance.manage |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::AppState;
use crate::auth::{Permission, require_permission};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/performance", routes())
}

fn routes() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/reviews", get(handler::list_reviews))
        .route("/reviews/{id}", get(handler::get_review))
        .route("/goals", get(handler::list_goals))
        .route("/goals/{id}", get(handler::get_goal))
        .route("/goals/user/{user_id}", get(handler::user_goals))
        .route("/analytics/overview", get(handler::overview))
        .layer(middleware::from_fn(require_permission(Permission::PerformanceRead)));

    let manage_routes = Router::new()
        .route("/reviews", post(handler::create_review))
        .route(
            "/reviews/{id}",
            put(handler::update_review).delete(handler::delete_review),
        )
        .route("/goals", post(handler::create_goal))
        .route(
            "/goals/{id}",
            put(handler::update_goal).delete(handler::delete_goal),
        )
        .layer(middleware::from_fn(require_permission(Permission::PerformanceManage)));

    read_routes.merge(manage_routes)
}
