//! CurrentUser extractor
//!
//! Handlers behind [`super::require_auth`] take `CurrentUser` as an argument.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::AppError;

use super::CurrentUser;
use crate::AppState;

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(AppError::not_authenticated)
    }
}
