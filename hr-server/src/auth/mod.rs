//! 认证授权模块
//!
//! - [`JwtService`] - access / refresh token service
//! - [`CurrentUser`] - identity resolved from the store on every request
//! - [`require_auth`] - authentication middleware
//! - [`require_permission`] / [`require_role`] - authorization gates

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;

use shared::models::{Role, UserStatus, UserSummary};
use shared::{AppError, AppResult, ErrorCode};

pub use jwt::{Claims, JwtConfig, JwtError, JwtService, TokenKind, TokenPair};
pub use middleware::{CurrentUserExt, require_auth, require_permission, require_role};
pub use permissions::{Permission, PermissionSet, SystemRole};

use crate::db::{Store, UserRecord};

/// Authenticated identity: user, role name and resolved permission set
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub employee_id: String,
    pub email: String,
    pub role_id: String,
    pub role: String,
    pub permissions: PermissionSet,
}

impl CurrentUser {
    pub fn new(record: &UserRecord, role: &Role) -> Self {
        Self {
            id: record.user.id.clone(),
            employee_id: record.user.employee_id.clone(),
            email: record.user.email.clone(),
            role_id: role.id.clone(),
            role: role.name.clone(),
            permissions: PermissionSet::from_tokens(&role.permissions),
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Role name is one of `roles`
    pub fn has_role(&self, roles: &[SystemRole]) -> bool {
        SystemRole::from_name(&self.role).is_some_and(|r| roles.contains(&r))
    }

    /// Acting on one's own resource, or holding `permission`
    pub fn is_self_or(&self, user_id: &str, permission: Permission) -> bool {
        self.id == user_id || self.has_permission(permission)
    }

    pub fn require_self_or(&self, user_id: &str, permission: Permission) -> AppResult<()> {
        if self.is_self_or(user_id, permission) {
            return Ok(());
        }
        crate::security_log!(
            "WARN",
            "permission_denied",
            user_id = self.id.clone(),
            target_user = user_id.to_string(),
            required_permission = permission.as_str()
        );
        Err(AppError::permission_denied(format!(
            "Permission denied: {permission}"
        )))
    }

    /// A caller only hands out roles whose permissions they already hold
    pub fn require_can_grant(&self, role: &Role) -> AppResult<()> {
        if self.permissions.covers(&PermissionSet::from_tokens(&role.permissions)) {
            return Ok(());
        }
        self.deny_role(ErrorCode::RoleExceedsCaller, None, role)
    }

    /// Guard for moving an existing account to `role`
    ///
    /// Keeping one's current role is a no-op; changing it is never allowed.
    pub fn require_assignable(&self, target_user_id: &str, role: &Role) -> AppResult<()> {
        if self.id == target_user_id {
            if self.role_id == role.id {
                return Ok(());
            }
            return self.deny_role(ErrorCode::CannotChangeOwnRole, Some(target_user_id), role);
        }
        if self.permissions.covers(&PermissionSet::from_tokens(&role.permissions)) {
            return Ok(());
        }
        self.deny_role(ErrorCode::RoleExceedsCaller, Some(target_user_id), role)
    }

    fn deny_role(&self, code: ErrorCode, target: Option<&str>, role: &Role) -> AppResult<()> {
        crate::security_log!(
            "WARN",
            "role_assignment_denied",
            user_id = self.id.clone(),
            target_user = target.unwrap_or("new account").to_string(),
            role = role.name.clone()
        );
        Err(AppError::new(code))
    }
}

/// Active user and role for `user_id`; `None` when the account cannot act
pub async fn resolve_identity(
    store: &dyn Store,
    user_id: &str,
) -> AppResult<Option<(UserRecord, Role)>> {
    let Some(record) = store.find_user(user_id).await? else {
        return Ok(None);
    };
    if record.user.status != UserStatus::Active {
        return Ok(None);
    }
    let Some(role) = store.find_role(&record.user.role_id).await? else {
        tracing::warn!(user_id, role_id = %record.user.role_id, "User references missing role");
        return Ok(None);
    };
    Ok(Some((record, role)))
}

/// Identity summary returned by login, register and `/me`
pub fn summarize(record: &UserRecord, role: &Role) -> UserSummary {
    UserSummary {
        id: record.user.id.clone(),
        employee_id: record.user.employee_id.clone(),
        email: record.user.email.clone(),
        first_name: record.profile.first_name.clone(),
        last_name: record.profile.last_name.clone(),
        role: role.name.clone(),
        permissions: role.permissions.clone(),
        status: record.user.status,
    }
}
