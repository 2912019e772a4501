//! Single-turn routing of inbound messages.
//!
//! Each message is resolved to a subscriber, matched against an ordered rule
//! list, and answered at most once (plus at most one apology). Unknown and
//! inactive senders never receive anything.

use pulse_core::{
  inbound::{InboundMessage, MessageKind},
  metrics::MetricSource,
  render,
  store::{SnapshotStore, SubscriberStore},
  subscriber::Subscriber,
  transport::{MessageId, Transport},
};

use crate::{Bridge, Dispatcher, Resolver, Result, bridge};

// ─── Grammar ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Insights,
}

type Rule = (fn(&str) -> bool, Command);

/// Checked in order; the first matching predicate wins.
const RULES: &[Rule] = &[(wants_insights, Command::Insights)];

fn wants_insights(body: &str) -> bool {
  ["insight", "report", "stats"].iter().any(|k| body.contains(k))
}

/// Classify an already case-folded and trimmed body.
pub fn classify(folded: &str) -> Option<Command> {
  RULES
    .iter()
    .find(|(matches, _)| matches(folded))
    .map(|(_, command)| *command)
}

// ─── Outcomes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
  NotText,
  UnknownSender,
  Inactive,
  NoCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
  Insights(MessageId),
  /// No snapshot yet, or an empty one.
  NotReady(MessageId),
  Apology(MessageId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
  Ignored(IgnoreReason),
  Replied(Reply),
  /// The reply and the apology both failed.
  Errored,
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub struct CommandRouter<S, M, T> {
  resolver:   Resolver<S>,
  bridge:     Bridge<S, M>,
  dispatcher: Dispatcher<T>,
}

impl<S, M, T> CommandRouter<S, M, T>
where
  S: SubscriberStore + SnapshotStore,
  M: MetricSource,
  T: Transport,
{
  pub fn new(resolver: Resolver<S>, bridge: Bridge<S, M>, dispatcher: Dispatcher<T>) -> Self {
    Self { resolver, bridge, dispatcher }
  }

  /// Handle one inbound message to completion.
  ///
  /// `Err` means the sender could not be resolved; nothing was sent.
  pub async fn handle(&self, message: &InboundMessage) -> Result<RouteOutcome> {
    if message.kind != MessageKind::Text {
      tracing::debug!(phone = %message.sender_phone, kind = ?message.kind, "ignoring non-text message");
      return Ok(RouteOutcome::Ignored(IgnoreReason::NotText));
    }

    let body = message.folded_body();
    let subscriber = match self.resolver.find_by_phone(&message.sender_phone).await? {
      Some(s) if s.active => s,
      Some(s) => {
        tracing::info!(subscriber_id = %s.subscriber_id, "ignoring inactive subscriber");
        return Ok(RouteOutcome::Ignored(IgnoreReason::Inactive));
      }
      None => {
        tracing::info!(phone = %message.sender_phone, "ignoring unknown sender");
        return Ok(RouteOutcome::Ignored(IgnoreReason::UnknownSender));
      }
    };

    let outcome = match classify(&body) {
      Some(Command::Insights) => self.send_insights(&subscriber).await,
      None => RouteOutcome::Ignored(IgnoreReason::NoCommand),
    };
    tracing::info!(subscriber_id = %subscriber.subscriber_id, outcome = ?outcome, "inbound handled");
    Ok(outcome)
  }

  async fn send_insights(&self, subscriber: &Subscriber) -> RouteOutcome {
    let id = subscriber.subscriber_id;
    let name = &subscriber.display_name;

    let sent = match self.bridge.current(id).await {
      Ok(Some(snapshot)) if !snapshot.is_empty() => self
        .dispatcher
        .send_text(&subscriber.phone, &bridge::render(&snapshot.data, name))
        .await
        .map(Reply::Insights),
      Ok(_) => self
        .dispatcher
        .send_text(&subscriber.phone, &render::no_insights_message(name))
        .await
        .map(Reply::NotReady),
      Err(e) => {
        tracing::error!(subscriber_id = %id, error = %e, "snapshot lookup failed");
        return self.apologise(subscriber).await;
      }
    };

    match sent {
      Ok(reply) => RouteOutcome::Replied(reply),
      Err(e) => {
        tracing::error!(subscriber_id = %id, error = %e, "reply failed");
        self.apologise(subscriber).await
      }
    }
  }

  async fn apologise(&self, subscriber: &Subscriber) -> RouteOutcome {
    match self
      .dispatcher
      .send_text(&subscriber.phone, render::ERROR_MESSAGE)
      .await
    {
      Ok(id) => RouteOutcome::Replied(Reply::Apology(id)),
      Err(e) => {
        tracing::error!(
          subscriber_id = %subscriber.subscriber_id,
          error = %e,
          "apology failed"
        );
        RouteOutcome::Errored
      }
    }
  }

  // ─── Direct invocations ─────────────────────────────────────────────────────

  /// Deactivate `subscriber` and confirm. The deactivation stands even if
  /// the confirmation cannot be delivered.
  pub async fn unsubscribe(&self, subscriber: &Subscriber) -> Result<MessageId> {
    self.resolver.deactivate(subscriber.subscriber_id).await?;
    let body = render::unsubscribe_message(&subscriber.display_name);
    Ok(self.dispatcher.send_text(&subscriber.phone, &body).await?)
  }

  pub async fn send_help(&self, phone: &str, display_name: Option<&str>) -> Result<MessageId> {
    let body = render::help_message(display_name);
    Ok(self.dispatcher.send_text(phone, &body).await?)
  }

  pub async fn welcome(&self, subscriber: &Subscriber) -> Result<MessageId> {
    let body = render::welcome_message(&subscriber.display_name);
    Ok(self.dispatcher.send_text(&subscriber.phone, &body).await?)
  }
}
