//! Error types for maf-web handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::LookupError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Remote anime list or figure API failed (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// maf-common error
    #[error("Common error: {0}")]
    Common(#[from] maf_common::Error),
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::AnimeList(msg) => ApiError::BadRequest(msg),
            LookupError::Client(e) => ApiError::Upstream(e.to_string()),
            LookupError::Common(e) => ApiError::Common(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ClientError;

    #[test]
    fn test_lookup_errors_map_to_status() {
        let upstream: ApiError = LookupError::Client(ClientError::Network("timeout".into())).into();
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);

        let list: ApiError = LookupError::AnimeList("Invalid username".into()).into();
        assert_eq!(list.into_response().status(), StatusCode::BAD_REQUEST);

        let common: ApiError =
            LookupError::Common(maf_common::Error::Config("bad root folder".into())).into();
        assert_eq!(common.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
