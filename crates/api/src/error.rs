//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use orcamento_shared::AppError;

/// Error returned by handlers, rendered as `{"error": code, "message": text}`.
///
/// Anything that converts into [`AppError`] converts into `ApiError`, so
/// handlers can use `?` on repository and domain results.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// 400 with `message`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 403 with the standard message.
    #[must_use]
    pub fn forbidden() -> Self {
        Self(AppError::Forbidden("Acesso negado".to_string()))
    }

    /// 404 with `message`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(AppError::NotFound(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
            "Erro interno do servidor".to_string()
        } else {
            self.0.message().to_string()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

/// Maps a raw database error, for repository calls that return `DbErr`.
#[allow(clippy::needless_pass_by_value)]
pub fn db_error(err: sea_orm::DbErr) -> ApiError {
    ApiError(AppError::Database(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_client_error_keeps_message() {
        let (status, json) = body(ApiError::validation("Campo mes é obrigatório")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["message"], "Campo mes é obrigatório");
    }

    #[tokio::test]
    async fn test_server_error_hides_details() {
        let (status, json) = body(db_error(sea_orm::DbErr::Custom("connection reset".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "database_error");
        assert_eq!(json["message"], "Erro interno do servidor");
    }

    #[tokio::test]
    async fn test_domain_errors_convert() {
        let err: ApiError = orcamento_core::workflow::WorkflowError::PlannedAmountFrozen.into();
        let (status, json) = body(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "forbidden");
    }
}
