//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{ErrorKind, ShopError};
use serde::Serialize;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request carried no usable actor identity.
    #[error("{0}")]
    Unauthorized(String),

    /// The request could not be decoded.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Shop(#[from] ShopError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorKind::InvalidRequest.as_str()),
            ApiError::Shop(err) => {
                let kind = err.kind();
                let status = match kind {
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                    ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                    ErrorKind::Conflict => StatusCode::CONFLICT,
                    ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, kind.as_str())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal server error");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: message,
            kind,
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use common::OrderId;
    use store::StoreError;

    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (ShopError::OrderNotFound(OrderId::new()), StatusCode::NOT_FOUND),
            (ShopError::Forbidden("no".to_string()), StatusCode::FORBIDDEN),
            (ShopError::InvalidRange, StatusCode::BAD_REQUEST),
            (ShopError::Conflict("dup".to_string()), StatusCode::CONFLICT),
            (
                ShopError::Storage(StoreError::Corrupt("x".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn unauthorized_is_401() {
        let response = ApiError::Unauthorized("missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
