//! Async HTTP client for the WhatsApp Business Cloud API.

use std::time::Duration;

use pulse_core::{
  phone,
  template::TemplateMessage,
  transport::{MessageId, Transport, TransportError},
};
use reqwest::Client;
use serde::Deserialize;

use crate::{
  Result,
  payload::{OutboundMessage, SendResponse, provider_message},
};

fn default_api_base_url() -> String { "https://graph.facebook.com".to_owned() }
fn default_api_version() -> String { "v18.0".to_owned() }
fn default_timeout_secs() -> u64 { 30 }

/// Connection settings for the Graph API.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
  #[serde(default = "default_api_base_url")]
  pub api_base_url:    String,
  #[serde(default = "default_api_version")]
  pub api_version:     String,
  /// The sending number's id, not the number itself.
  pub phone_number_id: String,
  pub access_token:    String,
  /// Per-request timeout; a send that exceeds it fails with no status.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:    u64,
}

/// What the API reports about the sending number.
#[derive(Debug, Clone, Deserialize)]
pub struct PhoneNumberInfo {
  #[serde(default)]
  pub display_phone_number: Option<String>,
  #[serde(default)]
  pub verified_name:        Option<String>,
}

/// Graph API client. Clones share the inner [`reqwest::Client`] pool.
#[derive(Clone)]
pub struct WhatsAppClient {
  client: Client,
  config: WhatsAppConfig,
}

impl WhatsAppClient {
  pub fn new(config: WhatsAppConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/{}/{}{}",
      self.config.api_base_url.trim_end_matches('/'),
      self.config.api_version,
      self.config.phone_number_id,
      path
    )
  }

  async fn post_message(&self, payload: &OutboundMessage<'_>) -> Result<MessageId, TransportError> {
    let resp = self
      .client
      .post(self.url("/messages"))
      .bearer_auth(&self.config.access_token)
      .json(payload)
      .send()
      .await
      .map_err(|e| TransportError::new(None, e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(TransportError::new(Some(status.as_u16()), provider_message(&body)));
    }

    let parsed: SendResponse = resp
      .json()
      .await
      .map_err(|e| TransportError::new(Some(status.as_u16()), e.to_string()))?;

    Ok(MessageId(
      parsed
        .messages
        .into_iter()
        .next()
        .map(|m| m.id)
        .unwrap_or_else(|| "unknown".to_owned()),
    ))
  }

  /// `GET /{phone_number_id}`: confirms the credentials work.
  pub async fn check_connection(&self) -> Result<PhoneNumberInfo> {
    let resp = self
      .client
      .get(self.url(""))
      .bearer_auth(&self.config.access_token)
      .send()
      .await
      .map_err(|e| TransportError::new(None, e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(TransportError::new(Some(status.as_u16()), provider_message(&body)).into());
    }

    let info = resp
      .json()
      .await
      .map_err(|e| TransportError::new(Some(status.as_u16()), e.to_string()))?;
    Ok(info)
  }
}

impl Transport for WhatsAppClient {
  async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, TransportError> {
    let to = phone::normalize(to);
    let result = self.post_message(&OutboundMessage::text(&to, body)).await;
    match &result {
      Ok(id) => tracing::debug!(phone = %to, message_id = %id, "text message sent"),
      Err(e) => tracing::debug!(phone = %to, error = %e, "text message failed"),
    }
    result
  }

  async fn send_template(
    &self,
    to: &str,
    template: &TemplateMessage,
  ) -> Result<MessageId, TransportError> {
    let to = phone::normalize(to);
    let result = self
      .post_message(&OutboundMessage::template(&to, template))
      .await;
    match &result {
      Ok(id) => {
        tracing::debug!(phone = %to, template = %template.name, message_id = %id, "template sent")
      }
      Err(e) => {
        tracing::debug!(phone = %to, template = %template.name, error = %e, "template failed")
      }
    }
    result
  }
}
