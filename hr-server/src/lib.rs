//! HR server
//!
//! REST backend for employee records, attendance, leave, performance
//! reviews and recruitment.
//!
//! # 模块结构
//!
//! ```text
//! hr-server/
//! ├── api/         # HTTP 路由和处理器
//! ├── attendance/  # 考勤状态机与汇总
//! ├── auth/        # JWT 认证、权限模型、中间件
//! ├── db/          # 存储抽象 (PostgreSQL / 内存)
//! ├── departments  # 部门目录与人数统计
//! ├── leave/       # 请假生命周期与余额台账
//! ├── middleware/  # 访问日志、请求 ID
//! ├── performance  # 绩效评估与目标
//! ├── recruitment  # 职位、候选人、申请
//! └── utils/       # 校验、时间工具
//! ```

pub mod api;
pub mod attendance;
pub mod auth;
pub mod config;
pub mod db;
pub mod departments;
pub mod employees;
pub mod leave;
pub mod middleware;
pub mod performance;
pub mod recruitment;
pub mod reports;
pub mod state;
pub mod utils;

pub use config::Config;
pub use state::AppState;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

fn cors_layer(config: &Config) -> CorsLayer {
    match config
        .cors_allow_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

/// Build the application with all routes, middleware and state
///
/// Used by the binary and by the integration tests.
pub fn build_app(state: AppState) -> Router {
    api::router()
        // CORS - Handle cross-origin requests
        .layer(cors_layer(&state.config))
        // Access log (runs after authentication, sees the user)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            middleware::XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // JWT authentication - injects CurrentUser
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .with_state(state)
}
