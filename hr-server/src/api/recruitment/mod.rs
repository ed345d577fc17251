//! Recruitment API Module
//!
//! Reads need `recruitment.read`, writes `recruitment.manage`.
//!
//! | 路径 | 方法 |
//! |------|------|
//! | /api/recruitment/jobs, /jobs/{id} | GET, POST, PUT, DELETE |
//! | /api/recruitment/candidates, /candidates/{id} | GET, POST, PUT, DELETE |
//! | /api/recruitment/applications, /applications/{id} | GET, POST, PUT, DELETE |
//! | /api/recruitment/analytics/pipeline, /analytics/metrics | GET |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::AppState;
use crate::auth::{Permission, require_permission};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/recruitment", routes())
}

fn routes() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/jobs", get(handler::list_jobs))
        .route("/jobs/{id}", get(handler::get_job))
        .route("/candidates", get(handler::list_candidates))
        .route("/candidates/{id}", get(handler::get_candidate))
        .route("/applications", get(handler::list_applications))
        .route("/applications/{id}", get(handler::get_application))
        .route("/analytics/pipeline", get(handler::pipeline))
        .route("/analytics/metrics", get(handler::metrics))
        .layer(middleware::from_fn(require_permission(Permission::RecruitmentRead)));

    let manage_routes = Router::new()
        .route("/jobs", post(handler::create_job))
        .route("/jobs/{id}", put(handler::update_job).delete(handler::delete_job))
        .route("/candidates", post(handler::create_candidate))
        .route(
            "/candidates/{id}",
            put(handler::update_candidate).delete(handler::delete_candidate),
        )
        .route("/applications", post(handler::create_application))
        .route(
            "/applications/{id}",
            put(handler::update_application).delete(handler::delete_application),
        )
        .layer(middleware::from_fn(require_permission(Permission::RecruitmentManage)));

    read_routes.merge(manage_routes)
}
