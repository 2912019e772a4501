//! Error type for `pulse-whatsapp`.

use pulse_core::transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),

  #[error(transparent)]
  Transport(#[from] TransportError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
