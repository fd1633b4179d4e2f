//! Error types for the anime server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to API clients. Server-side failures are not described.
    pub fn developer_message(&self) -> String {
        match self {
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error body returned by every failing request.
///
/// `path` and `timestamp` are filled in by the error normalizer middleware,
/// `trace` only when the request asked for it with `trace=true`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub status: u16,
    pub error: String,
    pub developer_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ErrorBody {
    pub fn new(status: StatusCode, developer_message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            path: None,
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            developer_message: developer_message.into(),
            trace: None,
        }
    }
}

/// Rendered failure details, attached to the response extensions so the
/// normalizer can rebuild the body without re-parsing it.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub developer_message: String,
    pub trace: String,
}

impl ErrorReport {
    pub fn from_error(err: &AppError) -> Self {
        Self {
            developer_message: err.developer_message(),
            trace: render_trace(err),
        }
    }
}

/// Display text of the error followed by its `source()` chain, one cause per line.
pub fn render_trace(err: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {}", cause));
        source = cause.source();
    }
    lines.join("\n")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Database(e) => tracing::error!("Database error: {:?}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Authentication(msg) | AppError::Authorization(msg) => {
                tracing::debug!("Access denied ({}): {}", status, msg)
            }
            _ => {}
        }

        let report = ErrorReport::from_error(&self);
        let mut response = (status, Json(ErrorBody::new(status, report.developer_message.clone())))
            .into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn not_found_maps_to_404_with_message() {
        let response = AppError::NotFound("Anime not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());

        let json = body_json(response).await;
        assert_eq!(json["status"], 404);
        assert_eq!(json["error"], "Not Found");
        assert_eq!(json["developerMessage"], "Anime not found");
        assert!(json.get("trace").is_none());
    }

    #[tokio::test]
    async fn each_variant_has_its_status() {
        let cases = [
            (AppError::Validation("x".into()), 400),
            (AppError::Authentication("x".into()), 401),
            (AppError::Authorization("x".into()), 403),
            (AppError::NotFound("x".into()), 404),
            (AppError::Internal("x".into()), 500),
            (AppError::Database(sqlx::Error::RowNotFound), 500),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status().as_u16(), expected);
        }
    }

    #[tokio::test]
    async fn internal_errors_are_sanitized() {
        let response = AppError::Internal("pool exhausted at 10.0.0.4".into()).into_response();
        let report = response.extensions().get::<ErrorReport>().cloned().expect("report");
        assert!(report.trace.contains("10.0.0.4"));

        let json = body_json(response).await;
        assert_eq!(json["status"], 500);
        assert_eq!(json["developerMessage"], "Internal server error");
    }

    #[test]
    fn trace_walks_the_source_chain() {
        let err = AppError::Database(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )));
        let trace = render_trace(&err);
        let mut lines = trace.lines();
        assert!(lines.next().unwrap().starts_with("Database error: "));
        assert_eq!(lines.next(), Some("caused by: connection refused"));
    }
}
