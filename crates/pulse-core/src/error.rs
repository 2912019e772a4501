//! Error types for `pulse-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The phone number does not normalise to 10–15 digits.
  #[error("invalid phone number: {0:?}")]
  InvalidPhone(String),

  #[error("unknown frequency: {0:?}")]
  UnknownFrequency(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
