//! Inbound webhook envelope.
//!
//! The provider nests each message under `entry[].changes[].value.messages[]`.
//! Status callbacks (delivered, read, ...) arrive through the same endpoint
//! with no `messages` array and lift to nothing. Messages without a sender
//! have no one to answer and are dropped.

use pulse_core::inbound::{InboundMessage, MessageKind};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
  #[serde(default)]
  pub entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
  #[serde(default)]
  pub changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Change {
  #[serde(default)]
  pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
  #[serde(default)]
  pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
  #[serde(default)]
  pub from: String,
  #[serde(rename = "type", default)]
  pub kind: String,
  #[serde(default)]
  pub text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
  #[serde(default)]
  pub body: String,
}

impl WebhookPayload {
  /// Every message in the envelope, in delivery order.
  pub fn into_messages(self) -> Vec<InboundMessage> {
    self
      .entry
      .into_iter()
      .flat_map(|e| e.changes)
      .flat_map(|c| c.value.messages)
      .filter(|m| !m.from.trim().is_empty())
      .map(WebhookMessage::into_inbound)
      .collect()
  }
}

impl WebhookMessage {
  fn into_inbound(self) -> InboundMessage {
    let kind = MessageKind::from_provider(&self.kind);
    let body = match kind {
      MessageKind::Text => self.text.map(|t| t.body).unwrap_or_default(),
      MessageKind::Other(_) => String::new(),
    };
    InboundMessage { sender_phone: self.from, kind, body }
  }
}

/// Parameters of the provider's subscription handshake
/// (`GET /webhook?hub.mode=subscribe&hub.verify_token=..&hub.challenge=..`).
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
  #[serde(rename = "hub.mode")]
  pub mode:         Option<String>,
  #[serde(rename = "hub.verify_token")]
  pub verify_token: Option<String>,
  #[serde(rename = "hub.challenge")]
  pub challenge:    Option<String>,
}

impl VerifyQuery {
  /// The challenge to echo back, if the handshake matches `expected_token`.
  pub fn accept(self, expected_token: &str) -> Option<String> {
    match (self.mode.as_deref(), self.verify_token.as_deref()) {
      (Some("subscribe"), Some(token)) if token == expected_token => self.challenge,
      _ => None,
    }
  }
}
