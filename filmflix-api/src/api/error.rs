//! Error responses
//!
//! Every failure is a JSON object `{"message": "..."}` with the matching
//! status code. Store and internal failures are logged and reported as 500
//! without detail.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or wrong admin key (403)
    #[error("{0}")]
    Forbidden(String),

    /// filmflix-common error
    #[error(transparent)]
    Common(#[from] filmflix_common::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use filmflix_common::Error as Common;

        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Common(err) => match err {
                Common::Validation(_) | Common::InvalidInput(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                Common::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
                other => {
                    error!("Request failed: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use filmflix_common::ValidationError;

    #[test]
    fn status_mapping() {
        let cases = [
            (
                ApiError::from(filmflix_common::Error::from(ValidationError::Missing {
                    kind: "actor",
                })),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(filmflix_common::Error::NotFound("Film not found".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(filmflix_common::Error::Store("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Forbidden("Forbidden".into()), StatusCode::FORBIDDEN),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
