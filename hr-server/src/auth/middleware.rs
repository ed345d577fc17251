//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::AppError;

use super::permissions::{Permission, SystemRole};
use super::{CurrentUser, JwtError, JwtService, TokenKind, resolve_identity};
use crate::AppState;
use crate::security_log;

/// Routes reachable without a token
const PUBLIC_ROUTES: &[&str] = &[
    "/api/auth/login",
    "/api/auth/register",
    "/api/auth/refresh",
    "/api/auth/logout",
    "/api/auth/forgot-password",
];

/// 认证中间件 - 要求用户登录
///
/// Validates `Authorization: Bearer <access token>`, then re-resolves the user
/// and role from the store so deactivation and role changes apply at once.
/// The resolved [`CurrentUser`] is inserted into the request extensions.
///
/// Skipped for `OPTIONS` (CORS preflight), non-`/api/` paths and
/// [`PUBLIC_ROUTES`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (health, 404)
    if !path.starts_with("/api/") || PUBLIC_ROUTES.contains(&path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::not_authenticated());
        }
    };

    let claims = match state.jwt.validate(token, TokenKind::Access) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );
            return Err(match e {
                JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            });
        }
    };

    let Some((record, role)) = resolve_identity(state.store.as_ref(), &claims.sub).await? else {
        security_log!("WARN", "auth_inactive_user", user_id = claims.sub.clone());
        return Err(AppError::invalid_token("User not found or inactive"));
    };

    req.extensions_mut()
        .insert(CurrentUser::new(&record, &role));
    Ok(next.run(req).await)
}

/// 权限检查中间件 - 要求特定权限
///
/// Passes iff the identity's set holds `permission` or the wildcard.
///
/// ```ignore
/// Router::new()
///     .route("/api/leave/requests/{id}/approve", put(handler::approve))
///     .layer(middleware::from_fn(require_permission(Permission::LeaveApprove)));
/// ```
pub fn require_permission(
    permission: Permission,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req.current_user()?;

            if !user.has_permission(permission) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id.clone(),
                    role = user.role.clone(),
                    required_permission = permission.as_str()
                );
                return Err(AppError::permission_denied(format!(
                    "Permission denied: {}",
                    permission
                )));
            }

            Ok(next.run(req).await)
        })
    }
}

/// 角色检查中间件 - 要求角色之一
pub fn require_role(
    roles: &'static [SystemRole],
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req.current_user()?;

            if !user.has_role(roles) {
                security_log!(
                    "WARN",
                    "role_required",
                    user_id = user.id.clone(),
                    role = user.role.clone()
                );
                return Err(AppError::role_required());
            }

            Ok(next.run(req).await)
        })
    }
}

/// 从请求中提取 CurrentUser 的扩展方法
pub trait CurrentUserExt {
    /// 未认证返回 401
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or_else(AppError::not_authenticated)
    }
}
