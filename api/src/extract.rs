//! Custom extractors that convert axum rejections to structured AppError responses.
//!
//! `AppJson<T>` is a drop-in replacement for `axum::Json<T>` in handler
//! signatures: deserialization failures produce a JSON `ApiError` body instead
//! of axum's default plain-text 422 response, so the admin console can show
//! which field was wrong.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

/// Convert a `JsonRejection` to a structured `AppError::Validation`, pulling
/// the offending field name out of serde's message when it names one.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field_hint = field_from_serde_message(&body_text);

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field_hint.unwrap_or_else(|| "body".to_string())),
        received: None,
        docs_hint: Some(
            "Check the request body against the endpoint's schema (GET /api-doc/openapi.json)."
                .to_string(),
        ),
    }
}

/// Serde reports "missing field `x`" / "unknown field `x`"; pick out `x`.
fn field_from_serde_message(msg: &str) -> Option<String> {
    for pattern in ["missing field `", "unknown field `"] {
        if let Some(start) = msg.find(pattern) {
            let after = &msg[start + pattern.len()..];
            if let Some(end) = after.find('`') {
                return Some(after[..end].to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::field_from_serde_message;

    #[test]
    fn extracts_missing_field_name() {
        let msg = "Failed to deserialize: missing field `field_key` at line 1 column 42";
        assert_eq!(
            field_from_serde_message(msg),
            Some("field_key".to_string())
        );
    }

    #[test]
    fn extracts_unknown_field_name() {
        let msg = "unknown field `persona`, expected one of `field_key`, `value`";
        assert_eq!(field_from_serde_message(msg), Some("persona".to_string()));
    }

    #[test]
    fn returns_none_for_generic_error() {
        let msg = "invalid type: string, expected u64";
        assert_eq!(field_from_serde_message(msg), None);
    }
}
