//! Error normalizer
//!
//! Outermost error boundary. Every 4xx/5xx response leaving the router is
//! rewritten into [`ErrorBody`], whether it came from an [`AppError`] or from
//! an axum rejection, the fallback, or a caught panic.
//!
//! [`AppError`]: crate::error::AppError

use axum::{
    body::Body,
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ErrorBody, ErrorReport};

/// Largest framework error body read back into `developerMessage`
const REJECTION_BODY_LIMIT: usize = 16 * 1024;

pub async fn normalize_errors(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let include_trace = trace_requested(request.uri().query());

    let response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let report = match parts.extensions.remove::<ErrorReport>() {
        Some(report) => report,
        None => framework_report(status, &method, &path, body).await,
    };

    let mut error_body = ErrorBody::new(status, report.developer_message);
    error_body.path = Some(path);
    if include_trace {
        error_body.trace = Some(report.trace);
    }

    let (json_parts, json_body) = Json(error_body).into_response().into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    if let Some(content_type) = json_parts.headers.get(header::CONTENT_TYPE) {
        parts.headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    Response::from_parts(parts, json_body)
}

/// True when the query string carries a `trace=true` pair
pub fn trace_requested(query: Option<&str>) -> bool {
    query.is_some_and(|q| q.split('&').any(|pair| pair.eq_ignore_ascii_case("trace=true")))
}

/// Describe an error response that did not originate from an `AppError`
async fn framework_report(status: StatusCode, method: &Method, path: &str, body: Body) -> ErrorReport {
    let text = axum::body::to_bytes(body, REJECTION_BODY_LIMIT)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default();
    let reason = status.canonical_reason().unwrap_or("Unknown error");

    let developer_message = if status.is_server_error() {
        if !text.is_empty() {
            tracing::error!(%status, %method, path, "Unhandled server error: {}", text);
        }
        "Internal server error".to_string()
    } else if !text.is_empty() {
        text.clone()
    } else if status == StatusCode::METHOD_NOT_ALLOWED {
        format!("Request method '{}' is not supported for {}", method, path)
    } else {
        reason.to_string()
    };

    let detail = if text.is_empty() { reason } else { text.as_str() };
    ErrorReport {
        developer_message,
        trace: format!("{} {} -> {}: {}", method, path, status, detail),
    }
}
