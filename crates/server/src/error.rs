//! HTTP mapping of [`AppError`].

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docqa_core::AppError;
use serde_json::json;

/// Handler error: an [`AppError`] rendered as `{"error": msg, "code": n}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            AppError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RetrievalUnavailable(_) | AppError::Generation(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Embedding(_) => StatusCode::BAD_GATEWAY,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::InvalidQuery(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Rejected request: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::InvalidQuery("x".into()), StatusCode::BAD_REQUEST),
            (AppError::DocumentNotFound("x".into()), StatusCode::NOT_FOUND),
            (
                AppError::RetrievalUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::Generation("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Embedding("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::RateLimited("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (AppError::Index("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body() {
        let response = ApiError(AppError::DocumentNotFound("nope.md".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"], "Document not found: nope.md");
        assert_eq!(body["code"], 404);
    }
}
