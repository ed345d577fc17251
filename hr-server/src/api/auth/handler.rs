//! Authentication Handlers
//!
//! Login, registration, token refresh, logout and the generic
//! forgot-password acknowledgement.

use std::sync::LazyLock;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use shared::models::UserSummary;
use shared::{ApiResponse, AppError, AppResult, ErrorCode};
use validator::Validate;

use crate::AppState;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{CurrentUser, SystemRole, TokenKind, TokenPair, resolve_identity, summarize};
use crate::employees::{self, NewEmployee};
use crate::security_log;
use crate::utils::serde_helpers;
use crate::utils::validation::validate_body;

/// Verified when the email is unknown so both failure paths cost one hash check
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-account-placeholder").ok());

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "serde_helpers::email")]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserSummary,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Employee ID must be at least 3 characters"))]
    pub employee_id: String,
    #[serde(deserialize_with = "serde_helpers::email")]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "First name must be at least 2 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100, message = "Last name must be at least 2 characters"))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(deserialize_with = "serde_helpers::email")]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

/// Login handler
///
/// Unknown email and wrong password produce the same error. An existing
/// account that is not ACTIVE is reported as such.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    validate_body(&req)?;
    let email = req.email;

    let Some(record) = state.store.find_user_by_email(&email).await? else {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = verify_password(&req.password, hash);
        }
        security_log!("WARN", "login_failed", email = email.clone(), reason = "unknown_email");
        return Err(AppError::invalid_credentials());
    };

    if !record.user.status.is_active() {
        security_log!(
            "WARN",
            "login_failed",
            email = email.clone(),
            reason = "account_not_active"
        );
        return Err(AppError::account_not_active());
    }

    if !verify_password(&req.password, &record.password_hash) {
        security_log!("WARN", "login_failed", email = email.clone(), reason = "bad_password");
        return Err(AppError::invalid_credentials());
    }

    let role = state
        .store
        .find_role(&record.user.role_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound))?;
    let tokens = state
        .jwt
        .issue_pair(&record.user.id)
        .map_err(|e| AppError::internal(format!("Failed to issue tokens: {e}")))?;

    security_log!(
        "INFO",
        "login_success",
        user_id = record.user.id.clone(),
        role = role.name.clone()
    );

    Ok(Json(ApiResponse::success_with_message(
        "Login successful",
        LoginResponse {
            user: summarize(&record, &role),
            tokens,
        },
    )))
}

/// Self-registration with the default role
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserSummary>>)> {
    validate_body(&req)?;

    let role = state
        .store
        .find_role_by_name(SystemRole::DEFAULT.name())
        .await?
        .ok_or_else(|| AppError::internal("Default role is not provisioned"))?;

    let record = employees::create_employee(
        state.store(),
        NewEmployee {
            employee_id: req.employee_id,
            email: req.email,
            password: req.password,
            role_id: role.id.clone(),
            department_id: None,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: None,
            position: None,
            hire_date: Some(state.now().date_naive()),
            salary: None,
        },
        state.now().timestamp_millis(),
    )
    .await?;

    tracing::info!(user_id = %record.user.id, email = %record.user.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "User registered successfully",
            summarize(&record, &role),
        )),
    ))
}

/// Exchange a refresh token for a new pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    validate_body(&req)?;

    let claims = state
        .jwt
        .validate(&req.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            security_log!("WARN", "refresh_failed", error = format!("{}", e));
            AppError::new(ErrorCode::RefreshTokenInvalid)
        })?;

    if resolve_identity(state.store(), &claims.sub).await?.is_none() {
        security_log!("WARN", "refresh_inactive_user", user_id = claims.sub.clone());
        return Err(AppError::new(ErrorCode::RefreshTokenInvalid));
    }

    let tokens = state
        .jwt
        .issue_pair(&claims.sub)
        .map_err(|e| AppError::internal(format!("Failed to issue tokens: {e}")))?;

    Ok(Json(ApiResponse::success_with_message(
        "Token refreshed successfully",
        tokens,
    )))
}

/// Tokens are stateless; the client discards them
pub async fn logout() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Logged out successfully"))
}

/// Same answer whether or not the account exists
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    validate_body(&req)?;
    let email = req.email;
    if let Some(record) = state.store.find_user_by_email(&email).await? {
        tracing::info!(user_id = %record.user.id, "Password reset requested");
    }
    Ok(Json(ApiResponse::message(FORGOT_PASSWORD_MESSAGE)))
}

pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<UserSummary>>> {
    let (record, role) = resolve_identity(state.store(), &user.id)
        .await?
        .ok_or_else(AppError::not_authenticated)?;
    Ok(Json(ApiResponse::success(summarize(&record, &role))))
}
