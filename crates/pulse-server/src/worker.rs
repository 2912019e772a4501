//! The inbound worker: drains the queue one message at a time.

use pulse_core::{
  inbound::InboundMessage,
  metrics::MetricSource,
  store::{SnapshotStore, SubscriberStore},
  transport::Transport,
};
use pulse_dispatch::CommandRouter;
use tokio::sync::mpsc;

/// Handle queued messages in arrival order until every sender is dropped.
///
/// Each message is finished (resolve, classify, reply) before the next is
/// taken. A resolution failure aborts only that message.
pub async fn run<S, M, T>(router: CommandRouter<S, M, T>, mut events: mpsc::Receiver<InboundMessage>)
where
  S: SubscriberStore + SnapshotStore,
  M: MetricSource,
  T: Transport,
{
  while let Some(message) = events.recv().await {
    if let Err(e) = router.handle(&message).await {
      tracing::error!(phone = %message.sender_phone, error = %e, "inbound message dropped");
    }
  }
  tracing::info!("inbound worker stopped");
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use pulse_core::{
    subscriber::NewSubscriber,
    template::TemplateMessage,
    transport::{MessageId, TransportError},
  };
  use pulse_dispatch::{Bridge, Dispatcher, Resolver};
  use pulse_store_sqlite::{CrmMetrics, SqliteStore};

  use super::*;

  #[derive(Default)]
  struct Outbox(Mutex<Vec<(String, String)>>);

  impl Transport for Outbox {
    async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, TransportError> {
      let mut sent = self.0.lock().unwrap();
      sent.push((to.to_owned(), body.to_owned()));
      Ok(MessageId(sent.len().to_string()))
    }

    async fn send_template(
      &self,
      to: &str,
      template: &TemplateMessage,
    ) -> Result<MessageId, TransportError> {
      self.send_text(to, &template.name).await
    }
  }

  #[tokio::test]
  async fn drains_queue_in_order_and_stops_when_closed() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let outbox = Arc::new(Outbox::default());
    let resolver = Resolver::new(store.clone());
    let bridge = Bridge::new(store.clone(), None::<Arc<CrmMetrics>>);
    let router = CommandRouter::new(resolver.clone(), bridge.clone(), Dispatcher::new(outbox.clone()));

    let ann = resolver.register(NewSubscriber::new("27820000001", "Ann")).await.unwrap();
    let ben = resolver.register(NewSubscriber::new("27820000002", "Ben")).await.unwrap();
    bridge.snapshot_for(&ben, true).await.unwrap();

    let (tx, rx) = mpsc::channel(8);
    let worker = tokio::spawn(run(router, rx));

    tx.send(InboundMessage::text("27829999999", "insights")).await.unwrap();
    tx.send(InboundMessage::text(&ann.phone, "insights")).await.unwrap();
    tx.send(InboundMessage::text(&ben.phone, "hello")).await.unwrap();
    tx.send(InboundMessage::text(&ben.phone, "report")).await.unwrap();
    drop(tx);
    worker.await.unwrap();

    let sent = outbox.0.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, ann.phone);
    assert!(sent[0].1.contains("No insights available yet"));
    assert_eq!(sent[1].0, ben.phone);
    assert!(sent[1].1.contains("Your Weekly Property Report"));
  }
}
