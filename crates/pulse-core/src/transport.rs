//! The outbound messaging capability.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::template::TemplateMessage;

/// Provider-assigned identifier of an accepted outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// The provider rejected the send or could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error ({}): {provider_message}", status_label(.status))]
pub struct TransportError {
  /// HTTP status returned by the provider; `None` when no response arrived
  /// (connection failure, timeout).
  pub status:           Option<u16>,
  /// The provider's error payload, or the client-side failure description.
  pub provider_message: String,
}

impl TransportError {
  pub fn new(status: Option<u16>, provider_message: impl Into<String>) -> Self {
    Self { status, provider_message: provider_message.into() }
  }
}

fn status_label(status: &Option<u16>) -> String {
  status.map_or_else(|| "no response".to_owned(), |s| s.to_string())
}

/// Sends one message to one recipient. No retries: a single failure is
/// surfaced to the caller, which decides what to do next.
///
/// `to` is the canonical phone; implementations must not rely on callers
/// having normalised it.
pub trait Transport: Send + Sync {
  fn send_text<'a>(
    &'a self,
    to: &'a str,
    body: &'a str,
  ) -> impl Future<Output = Result<MessageId, TransportError>> + Send + 'a;

  fn send_template<'a>(
    &'a self,
    to: &'a str,
    template: &'a TemplateMessage,
  ) -> impl Future<Output = Result<MessageId, TransportError>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_includes_status_or_marker() {
    let with_status = TransportError::new(Some(400), "Invalid parameter");
    assert_eq!(with_status.to_string(), "transport error (400): Invalid parameter");

    let without = TransportError::new(None, "timed out");
    assert_eq!(without.to_string(), "transport error (no response): timed out");
  }
}
