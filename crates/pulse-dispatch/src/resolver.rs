//! Subscriber resolution: phone lookup, registration and activation toggles.

use std::sync::Arc;

use pulse_core::{
  phone,
  store::SubscriberStore,
  subscriber::{NewSubscriber, Subscriber},
};
use uuid::Uuid;

use crate::{Error, Result};

/// Thin service over a [`SubscriberStore`]. Store failures surface as
/// [`Error::Resolution`] and are never retried here.
pub struct Resolver<S> {
  store: Arc<S>,
}

// Written out so cloning needs no `S: Clone`.
impl<S> Clone for Resolver<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: SubscriberStore> Resolver<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Look up the subscriber for a raw phone number in any accepted format.
  pub async fn find_by_phone(&self, raw: &str) -> Result<Option<Subscriber>> {
    let canonical = phone::normalize(raw);
    self
      .store
      .find_by_phone(&canonical)
      .await
      .map_err(Error::resolution)
  }

  pub async fn list_active(&self) -> Result<Vec<Subscriber>> {
    self
      .store
      .list_subscribers(Some(true))
      .await
      .map_err(Error::resolution)
  }

  pub async fn list_all(&self) -> Result<Vec<Subscriber>> {
    self
      .store
      .list_subscribers(None)
      .await
      .map_err(Error::resolution)
  }

  pub async fn get(&self, id: Uuid) -> Result<Option<Subscriber>> {
    self.store.get_subscriber(id).await.map_err(Error::resolution)
  }

  /// Normalise and validate the phone, then persist. An invalid phone never
  /// reaches the store.
  pub async fn register(&self, input: NewSubscriber) -> Result<Subscriber> {
    let input = input.normalized()?;
    let subscriber = self
      .store
      .create_subscriber(input)
      .await
      .map_err(Error::resolution)?;
    tracing::info!(
      subscriber_id = %subscriber.subscriber_id,
      phone = %subscriber.phone,
      "subscriber registered"
    );
    Ok(subscriber)
  }

  /// Soft-delete. Returns `false` if no such subscriber exists.
  pub async fn deactivate(&self, id: Uuid) -> Result<bool> {
    self.set_active(id, false).await
  }

  /// Undo [`Resolver::deactivate`].
  pub async fn reactivate(&self, id: Uuid) -> Result<bool> {
    self.set_active(id, true).await
  }

  async fn set_active(&self, id: Uuid, active: bool) -> Result<bool> {
    let found = self
      .store
      .set_active(id, active)
      .await
      .map_err(Error::resolution)?;
    if found {
      tracing::info!(subscriber_id = %id, active, "subscriber activation changed");
    }
    Ok(found)
  }

  pub(crate) async fn record_sent(
    &self,
    id: Uuid,
    at: chrono::DateTime<chrono::Utc>,
  ) -> Result<bool> {
    self.store.record_sent(id, at).await.map_err(Error::resolution)
  }
}
