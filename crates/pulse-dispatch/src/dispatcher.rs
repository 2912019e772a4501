//! Outbound dispatch: one message to one recipient, exactly one attempt.

use std::{sync::Arc, time::Duration};

use pulse_core::{
  phone,
  template::TemplateMessage,
  transport::{MessageId, Transport, TransportError},
};

/// Minimum pause between consecutive sends in a batch. The provider
/// throttles bursts from a single number.
pub const SEND_SPACING: Duration = Duration::from_secs(1);

pub struct Dispatcher<T> {
  transport: Arc<T>,
}

impl<T> Clone for Dispatcher<T> {
  fn clone(&self) -> Self { Self { transport: self.transport.clone() } }
}

impl<T: Transport> Dispatcher<T> {
  pub fn new(transport: Arc<T>) -> Self { Self { transport } }

  pub async fn send_text(&self, raw_phone: &str, body: &str) -> Result<MessageId, TransportError> {
    let to = phone::normalize(raw_phone);
    let result = self.transport.send_text(&to, body).await;
    log_result(&to, "text", &result);
    result
  }

  pub async fn send_template(
    &self,
    raw_phone: &str,
    template: &TemplateMessage,
  ) -> Result<MessageId, TransportError> {
    let to = phone::normalize(raw_phone);
    let result = self.transport.send_template(&to, template).await;
    log_result(&to, &template.name, &result);
    result
  }
}

fn log_result(to: &str, kind: &str, result: &Result<MessageId, TransportError>) {
  match result {
    Ok(id) => tracing::debug!(phone = %to, kind, message_id = %id, "dispatched"),
    Err(e) => tracing::warn!(phone = %to, kind, status = ?e.status, error = %e, "dispatch failed"),
  }
}
