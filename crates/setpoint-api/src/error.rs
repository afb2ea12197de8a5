//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// The settings manager is no longer accepting events.
  #[error("settings manager unavailable")]
  Unavailable,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<setpoint_manager::Error> for ApiError {
  fn from(e: setpoint_manager::Error) -> Self {
    match e {
      setpoint_manager::Error::Stopped => ApiError::Unavailable,
      setpoint_manager::Error::Store(source) => ApiError::Store(source),
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl From<setpoint_core::Error> for ApiError {
  fn from(e: setpoint_core::Error) -> Self { ApiError::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
