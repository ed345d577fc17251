//! Departments API Module
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/departments, /{id} | GET | 登录即可 |
//! | /api/departments, /{id} | POST, PUT | Administrator / HR Manager |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::AppState;
use crate::auth::{SystemRole, require_role};

const DEPARTMENT_ADMINS: &[SystemRole] = &[SystemRole::Administrator, SystemRole::HrManager];

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/departments", routes())
}

fn routes() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let admin_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update))
        .layer(middleware::from_fn(require_role(DEPARTMENT_ADMINS)));

    read_routes.merge(admin_routes)
}
