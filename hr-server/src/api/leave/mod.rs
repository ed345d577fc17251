//! Leave API Module
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/leave/types | GET | 登录即可 |
//! | /api/leave/types, /types/{id} | POST, PUT | Administrator / HR Manager |
//! | /api/leave/requests | GET, POST | 登录即可 (列表按权限收窄) |
//! | /api/leave/requests/{id} | GET, PUT | 本人或 leave.approve |
//! | /api/leave/requests/{id}/cancel | PUT | 本人 |
//! | /api/leave/requests/{id}/approve, /reject | PUT | leave.approve |
//! | /api/leave/requests/{id} | DELETE | Administrator |
//! | /api/leave/balances | GET | leave.approve |
//! | /api/leave/balances | PUT | Administrator / HR Manager |
//! | /api/leave/balances/user/{id} | GET | 本人或 leave.approve |

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::AppState;
use crate::auth::{Permission, SystemRole, require_permission, require_role};

/// Roles allowed to edit the catalog and allocations
const LEAVE_ADMINS: &[SystemRole] = &[SystemRole::Administrator, SystemRole::HrManager];

const ADMINISTRATORS: &[SystemRole] = &[SystemRole::Administrator];

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/leave", routes())
}

fn routes() -> Router<AppState> {
    let open_routes = Router::new()
        .route("/types", get(handler::list_types))
        .route(
            "/requests",
            get(handler::list_requests).post(handler::create_request),
        )
        .route(
            "/requests/{id}",
            get(handler::get_request).put(handler::update_request),
        )
        .route("/requests/{id}/cancel", put(handler::cancel_request))
        .route("/balances/user/{id}", get(handler::user_balances));

    let approve_routes = Router::new()
        .route("/requests/{id}/approve", put(handler::approve_request))
        .route("/requests/{id}/reject", put(handler::reject_request))
        .route("/balances", get(handler::list_balances))
        .layer(middleware::from_fn(require_permission(Permission::LeaveApprove)));

    let admin_routes = Router::new()
        .route("/types", post(handler::create_type))
        .route("/types/{id}", put(handler::update_type))
        .route("/balances", put(handler::set_allocation))
        .layer(middleware::from_fn(require_role(LEAVE_ADMINS)));

    let delete_routes = Router::new()
        .route("/requests/{id}", delete(handler::delete_request))
        .layer(middleware::from_fn(require_role(ADMINISTRATORS)));

    open_routes
        .merge(approve_routes)
        .merge(admin_routes)
        .merge(delete_routes)
}
