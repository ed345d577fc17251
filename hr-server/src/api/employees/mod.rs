//! Employee API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::AppState;
use crate::auth::{Permission, require_permission};

/// Employee router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/employees", routes())
}

fn routes() -> Router<AppState> {
    let list_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_permission(Permission::EmployeesRead)));

    let create_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission(Permission::EmployeesCreate)));

    let update_routes = Router::new()
        .route("/{id}", put(handler::update))
        .layer(middleware::from_fn(require_permission(Permission::EmployeesUpdate)));

    let delete_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_permission(Permission::EmployeesDelete)));

    // 本人或持有权限 (handler 内检查)
    let self_routes = Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route(
            "/{id}/profile",
            get(handler::get_profile).put(handler::update_profile),
        )
        .route("/{id}/stats", get(handler::stats));

    list_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
        .merge(self_routes)
}
