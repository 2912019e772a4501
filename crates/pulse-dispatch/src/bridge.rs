//! The metric/format bridge: generate a snapshot, store it, render it.

use std::sync::Arc;

use chrono::Local;
use pulse_core::{
  insight::{InsightData, InsightSnapshot},
  metrics::{MetricSource, mock_insights},
  render,
  store::SnapshotStore,
  subscriber::Subscriber,
  template::TemplateMessage,
};
use uuid::Uuid;

use crate::{Error, Result};

/// Couples a [`SnapshotStore`] with an optional live [`MetricSource`].
///
/// Without a live source only mock snapshots can be produced.
pub struct Bridge<S, M> {
  store:  Arc<S>,
  source: Option<Arc<M>>,
}

impl<S, M> Clone for Bridge<S, M> {
  fn clone(&self) -> Self { Self { store: self.store.clone(), source: self.source.clone() } }
}

impl<S, M> Bridge<S, M>
where
  S: SnapshotStore,
  M: MetricSource,
{
  pub fn new(store: Arc<S>, source: Option<Arc<M>>) -> Self { Self { store, source } }

  /// Generate fresh metrics for `subscriber` and overwrite their snapshot.
  pub async fn snapshot_for(
    &self,
    subscriber: &Subscriber,
    mock: bool,
  ) -> Result<InsightSnapshot> {
    let data = if mock {
      mock_insights()
    } else {
      let source = self.source.as_ref().ok_or(Error::NoMetricSource)?;
      source.generate(subscriber).await.map_err(Error::metrics)?
    };

    let snapshot = InsightSnapshot::new(subscriber.subscriber_id, data);
    self
      .store
      .put_snapshot(&snapshot)
      .await
      .map_err(Error::snapshot)?;

    tracing::debug!(
      subscriber_id = %subscriber.subscriber_id,
      metrics = snapshot.data.len(),
      mock,
      "snapshot stored"
    );
    Ok(snapshot)
  }

  /// The last stored snapshot, if any.
  pub async fn current(&self, subscriber_id: Uuid) -> Result<Option<InsightSnapshot>> {
    self
      .store
      .get_snapshot(subscriber_id)
      .await
      .map_err(Error::snapshot)
  }
}

/// Render `data` as the text report, dated today in local time.
pub fn render(data: &InsightData, display_name: &str) -> String {
  render::insights_message(data, display_name, Local::now().date_naive())
}

/// The `weekly_insights` template carrying the same figures as [`render`].
pub fn template(data: &InsightData, display_name: &str) -> TemplateMessage {
  TemplateMessage::weekly_insights(display_name, data)
}
