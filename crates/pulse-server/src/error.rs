//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Webhook verification handshake did not match.
  #[error("forbidden")]
  Forbidden,

  /// The inbound worker has stopped; events can no longer be accepted.
  #[error("inbound queue closed")]
  QueueClosed,

  #[error("invalid schedule: {0}")]
  Schedule(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Forbidden => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
      Error::QueueClosed => {
        (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
      }
      Error::Schedule(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
