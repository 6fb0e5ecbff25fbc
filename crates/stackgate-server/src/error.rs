//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Every variant renders as `{"granted": false, "message": ...}` so kiosk
/// clients can display the message without branching on status codes.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The scanned identifier was empty or unusable.
  #[error("bad request: {0}")]
  BadRequest(String),

  /// The identifier resolved to no known member.
  #[error("forbidden: {0}")]
  Forbidden(String),

  /// A collaborator store was unreachable; the scan is retryable.
  #[error("store unavailable: {0}")]
  Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Unavailable(_) => (
        StatusCode::SERVICE_UNAVAILABLE,
        "Service temporarily unavailable".to_string(),
      ),
    };
    (
      status,
      Json(json!({ "granted": false, "message": message })),
    )
      .into_response()
  }
}
