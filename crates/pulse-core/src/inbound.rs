//! Inbound message events, already lifted out of the provider's envelope.

use serde::{Deserialize, Serialize};

/// The message type reported by the provider. Only text is routed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
  Text,
  /// Anything else (image, audio, reaction, interactive, ...), with the
  /// provider's type name.
  Other(String),
}

impl MessageKind {
  pub fn from_provider(kind: &str) -> Self {
    match kind {
      "text" => Self::Text,
      other => Self::Other(other.to_owned()),
    }
  }
}

/// One inbound message. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
  pub sender_phone: String,
  pub kind:         MessageKind,
  /// Raw body as received. Empty for non-text messages.
  pub body:         String,
}

impl InboundMessage {
  pub fn text(sender_phone: impl Into<String>, body: impl Into<String>) -> Self {
    Self {
      sender_phone: sender_phone.into(),
      kind:         MessageKind::Text,
      body:         body.into(),
    }
  }

  /// Body trimmed and case-folded for command matching.
  pub fn folded_body(&self) -> String { self.body.trim().to_lowercase() }
}
