use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::application::LedgerError;

/// An error rendered as `{"success": false, "error": <code>, "message": <text>}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_argument", message)
    }
}

pub fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        LedgerError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::DuplicateEmail(_) | LedgerError::AccountInactive(_) => StatusCode::CONFLICT,
        LedgerError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        if let LedgerError::StoreUnavailable(source) = &err {
            tracing::error!(error = %format!("{:#}", source), "store failure");
        }
        Self::new(status_for(&err), err.code(), err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "serialization_error",
            err.to_string(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "success": false,
                "error": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (LedgerError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (LedgerError::DuplicateEmail("a@b".into()), StatusCode::CONFLICT),
            (LedgerError::AccountNotFound(9), StatusCode::NOT_FOUND),
            (LedgerError::AccountInactive(9), StatusCode::CONFLICT),
            (
                LedgerError::InsufficientFunds {
                    account_id: 1,
                    available: 0,
                    requested: 1,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LedgerError::StoreUnavailable(anyhow::anyhow!("locked")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }
}
