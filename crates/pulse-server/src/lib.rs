//! Pulse webhook server, inbound worker and weekly scheduler.
//!
//! The HTTP layer only parses and enqueues; every inbound message is handled
//! to completion by the single task in [`worker`], in arrival order.

pub mod error;
pub mod schedule;
pub mod webhook;
pub mod worker;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::get,
};
use chrono::Weekday;
use pulse_core::inbound::InboundMessage;
use pulse_dispatch::{BatchConfig, DeliveryMode, dispatcher::SEND_SPACING};
use pulse_whatsapp::WhatsAppConfig;
use serde::Deserialize;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "0.0.0.0".to_owned() }
fn default_port() -> u16 { 8000 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/pulse/pulse.db") }
fn default_inbound_queue() -> usize { 64 }

/// Runtime configuration, deserialised from `pulse.toml` and `PULSE_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
  /// CRM database for live metrics. Without it only mock runs succeed.
  #[serde(default)]
  pub crm_path:      Option<PathBuf>,
  /// Shared secret for the webhook verification handshake.
  pub verify_token:  String,
  #[serde(default = "default_inbound_queue")]
  pub inbound_queue: usize,
  pub whatsapp:      WhatsAppConfig,
  #[serde(default)]
  pub delivery:      DeliveryConfig,
  #[serde(default)]
  pub schedule:      ScheduleConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeliveryConfig {
  pub mock:          bool,
  pub mode:          DeliveryMode,
  /// Pause between subscribers. Values under one second are raised to it.
  pub spacing_ms:    u64,
  /// Link button suffix for `mode = "dashboard"`.
  pub dashboard_url: Option<String>,
}

impl Default for DeliveryConfig {
  fn default() -> Self {
    Self {
      mock:          false,
      mode:          DeliveryMode::Text,
      spacing_ms:    1000,
      dashboard_url: None,
    }
  }
}

impl DeliveryConfig {
  pub fn batch_config(&self) -> BatchConfig {
    BatchConfig {
      mock:          self.mock,
      mode:          self.mode,
      spacing:       Duration::from_millis(self.spacing_ms).max(SEND_SPACING),
      dashboard_url: self.dashboard_url.clone(),
    }
  }
}

/// When the weekly batch runs, in a fixed UTC offset.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
  pub weekday:            Weekday,
  /// `HH:MM`, 24-hour.
  pub time:               String,
  pub utc_offset_minutes: i32,
}

impl Default for ScheduleConfig {
  fn default() -> Self {
    Self { weekday: Weekday::Mon, time: "09:00".to_owned(), utc_offset_minutes: 120 }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  /// Producer side of the inbound queue drained by [`worker::run`].
  pub events: mpsc::Sender<InboundMessage>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/webhook", get(webhook::verify).post(webhook::receive))
    .route("/health",  get(webhook::health))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
