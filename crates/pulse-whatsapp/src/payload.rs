//! Wire shapes for the Graph API messages endpoint.

use pulse_core::template::TemplateMessage;
use serde::{Deserialize, Serialize};

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct OutboundMessage<'a> {
  messaging_product: &'static str,
  recipient_type:    &'static str,
  to:                &'a str,
  #[serde(flatten)]
  content:           Content<'a>,
}

impl<'a> OutboundMessage<'a> {
  pub fn text(to: &'a str, body: &'a str) -> Self {
    Self::new(to, Content::Text {
      text: TextContent { preview_url: false, body },
    })
  }

  pub fn template(to: &'a str, template: &'a TemplateMessage) -> Self {
    Self::new(to, Content::Template { template: TemplateContent::from(template) })
  }

  fn new(to: &'a str, content: Content<'a>) -> Self {
    Self {
      messaging_product: "whatsapp",
      recipient_type: "individual",
      to,
      content,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Content<'a> {
  Text { text: TextContent<'a> },
  Template { template: TemplateContent<'a> },
}

#[derive(Debug, Serialize)]
struct TextContent<'a> {
  preview_url: bool,
  body:        &'a str,
}

#[derive(Debug, Serialize)]
struct TemplateContent<'a> {
  name:       &'a str,
  language:   Language<'a>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  components: Vec<Component<'a>>,
}

#[derive(Debug, Serialize)]
struct Language<'a> {
  code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Component<'a> {
  Body {
    parameters: Vec<Parameter<'a>>,
  },
  Button {
    sub_type:   &'static str,
    index:      &'static str,
    parameters: Vec<Parameter<'a>>,
  },
}

#[derive(Debug, Serialize)]
struct Parameter<'a> {
  #[serde(rename = "type")]
  kind: &'static str,
  text: &'a str,
}

impl<'a> Parameter<'a> {
  fn text(text: &'a str) -> Self { Self { kind: "text", text } }
}

impl<'a> From<&'a TemplateMessage> for TemplateContent<'a> {
  fn from(t: &'a TemplateMessage) -> Self {
    let mut components = Vec::new();
    if !t.body_parameters.is_empty() {
      components.push(Component::Body {
        parameters: t.body_parameters.iter().map(|p| Parameter::text(p)).collect(),
      });
    }
    if let Some(url) = &t.url_button {
      components.push(Component::Button {
        sub_type:   "url",
        index:      "0",
        parameters: vec![Parameter::text(url)],
      });
    }

    Self {
      name: &t.name,
      language: Language { code: &t.language },
      components,
    }
  }
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendResponse {
  #[serde(default)]
  pub messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRef {
  pub id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  message: String,
}

/// The human-readable part of a Graph API error body, or the raw body if it
/// is not the usual `{"error": {"message": ...}}` shape.
pub fn provider_message(body: &str) -> String {
  serde_json::from_str::<ErrorEnvelope>(body)
    .map(|e| e.error.message)
    .unwrap_or_else(|_| body.to_owned())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn text_payload_shape() {
    let value = serde_json::to_value(OutboundMessage::text("27821234567", "hi")).unwrap();
    assert_eq!(
      value,
      json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": "27821234567",
        "type": "text",
        "text": { "preview_url": false, "body": "hi" }
      })
    );
  }

  #[test]
  fn template_payload_shape() {
    let mut template = TemplateMessage::new("insights_dashboard", "en").with_parameter("Ann");
    template.url_button = Some("ann".into());

    let value =
      serde_json::to_value(OutboundMessage::template("27821234567", &template)).unwrap();
    assert_eq!(value["type"], "template");
    assert_eq!(value["template"]["name"], "insights_dashboard");
    assert_eq!(value["template"]["language"]["code"], "en");
    assert_eq!(
      value["template"]["components"],
      json!([
        { "type": "body", "parameters": [{ "type": "text", "text": "Ann" }] },
        {
          "type": "button",
          "sub_type": "url",
          "index": "0",
          "parameters": [{ "type": "text", "text": "ann" }]
        }
      ])
    );
  }

  #[test]
  fn template_without_parameters_omits_components() {
    let template = TemplateMessage::new("hello_world", "en_US");
    let value =
      serde_json::to_value(OutboundMessage::template("27821234567", &template)).unwrap();
    assert!(value["template"].get("components").is_none());
  }

  #[test]
  fn provider_message_prefers_graph_error_text() {
    let body = r#"{"error":{"message":"(#131030) Recipient not in allowed list","type":"OAuthException","code":131030}}"#;
    assert_eq!(provider_message(body), "(#131030) Recipient not in allowed list");
    assert_eq!(provider_message("Bad Gateway"), "Bad Gateway");
  }
}
