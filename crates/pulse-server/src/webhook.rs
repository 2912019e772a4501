//! Handlers for the provider-facing endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/webhook` | Subscription handshake; echoes `hub.challenge` |
//! | `POST` | `/webhook` | Message notifications; enqueued, never handled inline |
//! | `GET`  | `/health`  | Liveness |

use axum::{
  Json,
  extract::{Query, State},
};
use pulse_whatsapp::webhook::{VerifyQuery, WebhookPayload};
use serde_json::{Value, json};

use crate::{AppState, Error, error::Result};

/// `GET /webhook?hub.mode=subscribe&hub.verify_token=..&hub.challenge=..`
pub async fn verify(
  State(state): State<AppState>,
  Query(query): Query<VerifyQuery>,
) -> Result<String> {
  match query.accept(&state.config.verify_token) {
    Some(challenge) => {
      tracing::info!("webhook verified");
      Ok(challenge)
    }
    None => {
      tracing::warn!("webhook verification rejected");
      Err(Error::Forbidden)
    }
  }
}

/// `POST /webhook`. Acknowledges as soon as every message is queued, so the
/// provider does not retry while a reply is still being sent.
pub async fn receive(
  State(state): State<AppState>,
  Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>> {
  for message in payload.into_messages() {
    tracing::debug!(phone = %message.sender_phone, kind = ?message.kind, "inbound message queued");
    state
      .events
      .send(message)
      .await
      .map_err(|_| Error::QueueClosed)?;
  }
  Ok(Json(json!({ "status": "ok" })))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
  Json(json!({ "status": "healthy", "service": "pulse-webhook" }))
}
