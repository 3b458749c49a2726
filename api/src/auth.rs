use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Admin authorization extracted from the `Authorization: Bearer <token>`
/// header. The token is a single static operator credential compared by
/// SHA-256 digest; when no token is configured the deployment runs in open
/// dev mode and every request passes.
#[derive(Debug, Clone)]
pub struct AdminToken;

impl FromRequestParts<AppState> for AdminToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected_hash) = &state.admin_token_hash else {
            return Ok(AdminToken);
        };

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized {
                message: "Authorization header must use the Bearer scheme".to_string(),
            })?;

        if !horizon_core::auth::verify_token(token, expected_hash) {
            return Err(AppError::Unauthorized {
                message: "Invalid admin token".to_string(),
            });
        }

        Ok(AdminToken)
    }
}
