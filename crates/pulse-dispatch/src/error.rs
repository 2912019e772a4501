//! Error type for `pulse-dispatch`.

use pulse_core::transport::TransportError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// Input rejected before any store write (bad phone number).
  #[error(transparent)]
  Validation(#[from] pulse_core::Error),

  /// The subscriber store failed. Fatal to the current turn or batch.
  #[error("resolution error: {0}")]
  Resolution(#[source] BoxError),

  #[error("snapshot store error: {0}")]
  Snapshot(#[source] BoxError),

  #[error("metric source error: {0}")]
  Metrics(#[source] BoxError),

  /// Live metrics were requested but no metric source is configured.
  #[error("no live metric source configured")]
  NoMetricSource,

  #[error(transparent)]
  Transport(#[from] TransportError),
}

impl Error {
  pub(crate) fn resolution(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Resolution(Box::new(e))
  }

  pub(crate) fn snapshot(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Snapshot(Box::new(e))
  }

  pub(crate) fn metrics(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Metrics(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
