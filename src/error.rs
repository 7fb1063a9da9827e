//! Request-level error type mapped onto HTTP status codes.
//!
//! Taxonomy follows how the rest of the crate degrades:
//! - cache/remote-write problems never reach this type (logged, treated as absent),
//! - definition/read problems surface as NotFound or Upstream,
//! - auth problems are fatal for the request,
//! - legacy submit failures carry the server-provided message back to the client.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;

use crate::protocol::StatusOut;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("invalid teacher key")]
  InvalidTeacherKey,

  #[error("access denied")]
  AccessDenied,

  #[error("malformed request: {0}")]
  BadRequest(String),

  #[error("upstream error: {0}")]
  Upstream(String),

  #[error("internal error: {0}")]
  Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = match self {
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::InvalidTeacherKey | AppError::AccessDenied => StatusCode::UNAUTHORIZED,
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
      AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    // Legacy clients key off {status:"error", message}; keep every error in that shape.
    (status, Json(StatusOut::error(self.to_string()))).into_response()
  }
}
