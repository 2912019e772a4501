//! Batch delivery: one sequential pass over the active subscribers.
//!
//! A failure for one subscriber is recorded and the pass moves on. Only a
//! failure to list subscribers aborts the run, in which case no report is
//! produced.

use std::{fmt, str::FromStr, time::Duration};

use chrono::Utc;
use pulse_core::{
  metrics::MetricSource,
  store::{SnapshotStore, SubscriberStore},
  subscriber::Subscriber,
  template::TemplateMessage,
  transport::{MessageId, Transport},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Bridge, Dispatcher, Resolver, Result, bridge,
  dispatcher::SEND_SPACING,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// How the report reaches the subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
  /// Free-form text. Only delivered inside the provider's 24-hour window.
  #[default]
  Text,
  /// The pre-approved `weekly_insights` template.
  Template,
  /// The pre-approved `insights_dashboard` template: a greeting and a link
  /// button instead of the figures.
  Dashboard,
}

impl fmt::Display for DeliveryMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Text => "text",
      Self::Template => "template",
      Self::Dashboard => "dashboard",
    })
  }
}

impl FromStr for DeliveryMode {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "template" => Ok(Self::Template),
      "dashboard" => Ok(Self::Dashboard),
      other => Err(format!("unknown delivery mode: {other:?}")),
    }
  }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
  /// Use the mock generator instead of the live metric source.
  pub mock:          bool,
  pub mode:          DeliveryMode,
  /// Pause between consecutive subscribers.
  pub spacing:       Duration,
  /// Suffix for the dashboard template's link button.
  pub dashboard_url: Option<String>,
}

impl Default for BatchConfig {
  fn default() -> Self {
    Self {
      mock:          false,
      mode:          DeliveryMode::default(),
      spacing:       SEND_SPACING,
      dashboard_url: None,
    }
  }
}

// ─── Report ───────────────────────────────────────────────────────────────────

/// The step at which a subscriber's delivery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Generate,
  Dispatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
  Sent { message_id: MessageId },
  /// The generated snapshot had no metrics; nothing was sent.
  Skipped,
  Failed { stage: Stage, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
  pub subscriber_id: Uuid,
  pub phone:         String,
  #[serde(flatten)]
  pub outcome:       Outcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryReport {
  pub sent_count:   usize,
  pub failed_count: usize,
  pub outcomes:     Vec<Delivery>,
}

impl DeliveryReport {
  pub fn skipped_count(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|d| d.outcome == Outcome::Skipped)
      .count()
  }

  fn push(&mut self, subscriber: &Subscriber, outcome: Outcome) {
    match outcome {
      Outcome::Sent { .. } => self.sent_count += 1,
      Outcome::Failed { .. } => self.failed_count += 1,
      Outcome::Skipped => {}
    }
    self.outcomes.push(Delivery {
      subscriber_id: subscriber.subscriber_id,
      phone: subscriber.phone.clone(),
      outcome,
    });
  }
}

// ─── Orchestrator ─────────────────────────────────────────────────────────────

pub struct Batch<S, M, T> {
  resolver:   Resolver<S>,
  bridge:     Bridge<S, M>,
  dispatcher: Dispatcher<T>,
}

impl<S, M, T> Batch<S, M, T>
where
  S: SubscriberStore + SnapshotStore,
  M: MetricSource,
  T: Transport,
{
  pub fn new(resolver: Resolver<S>, bridge: Bridge<S, M>, dispatcher: Dispatcher<T>) -> Self {
    Self { resolver, bridge, dispatcher }
  }

  /// Deliver to every active subscriber, one at a time.
  ///
  /// Returns `Err` only when the subscriber list cannot be read.
  pub async fn run(&self, config: &BatchConfig) -> Result<DeliveryReport> {
    let subscribers = self.resolver.list_active().await?;
    tracing::info!(
      subscribers = subscribers.len(),
      mock = config.mock,
      mode = %config.mode,
      "batch delivery started"
    );

    let mut report = DeliveryReport::default();
    for (i, subscriber) in subscribers.iter().enumerate() {
      if i > 0 && !config.spacing.is_zero() {
        tokio::time::sleep(config.spacing).await;
      }
      let outcome = self.deliver(subscriber, config).await;
      report.push(subscriber, outcome);
    }

    tracing::info!(
      sent = report.sent_count,
      failed = report.failed_count,
      skipped = report.skipped_count(),
      "batch delivery finished"
    );
    Ok(report)
  }

  async fn deliver(&self, subscriber: &Subscriber, config: &BatchConfig) -> Outcome {
    let id = subscriber.subscriber_id;

    let snapshot = match self.bridge.snapshot_for(subscriber, config.mock).await {
      Ok(s) => s,
      Err(e) => {
        tracing::error!(subscriber_id = %id, error = %e, "snapshot generation failed");
        return Outcome::Failed { stage: Stage::Generate, error: e.to_string() };
      }
    };
    if snapshot.is_empty() {
      tracing::warn!(subscriber_id = %id, "no metrics generated, skipping");
      return Outcome::Skipped;
    }

    let name = &subscriber.display_name;
    let sent = match config.mode {
      DeliveryMode::Text => {
        let body = bridge::render(&snapshot.data, name);
        self.dispatcher.send_text(&subscriber.phone, &body).await
      }
      DeliveryMode::Template => {
        let template = bridge::template(&snapshot.data, name);
        self.dispatcher.send_template(&subscriber.phone, &template).await
      }
      DeliveryMode::Dashboard => {
        let template = TemplateMessage::insights_dashboard(name, config.dashboard_url.as_deref());
        self.dispatcher.send_template(&subscriber.phone, &template).await
      }
    };
    let message_id = match sent {
      Ok(id) => id,
      Err(e) => {
        tracing::error!(subscriber_id = %id, error = %e, "delivery failed");
        return Outcome::Failed { stage: Stage::Dispatch, error: e.to_string() };
      }
    };

    // The message is out; a failed timestamp write does not undo that.
    if let Err(e) = self.resolver.record_sent(id, Utc::now()).await {
      tracing::warn!(subscriber_id = %id, error = %e, "could not record last_sent_at");
    }
    tracing::info!(subscriber_id = %id, message_id = %message_id, "insights delivered");
    Outcome::Sent { message_id }
  }
}
