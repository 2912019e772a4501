//! Storage traits for subscribers and insight snapshots.
//!
//! Implemented by storage backends (e.g. `pulse-store-sqlite`). The dispatch
//! services depend on these abstractions, never on a concrete backend. "No
//! rows" is always `Ok(None)`; errors are reserved for the store itself
//! failing.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  insight::InsightSnapshot,
  subscriber::{NewSubscriber, Subscriber},
};

/// Subscriber records keyed by an opaque, store-assigned id.
///
/// All methods return `Send` futures so implementations can be shared across
/// tokio tasks (the webhook worker and the scheduler).
pub trait SubscriberStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new subscriber. The phone is stored as given; callers are
  /// expected to have normalised it. Duplicate phones are not rejected.
  fn create_subscriber(
    &self,
    input: NewSubscriber,
  ) -> impl Future<Output = Result<Subscriber, Self::Error>> + Send + '_;

  /// Retrieve a subscriber by id. Returns `None` if not found.
  fn get_subscriber(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscriber>, Self::Error>> + Send + '_;

  /// Exact match on the canonical phone. When several records share a
  /// phone, the earliest created one is returned.
  fn find_by_phone<'a>(
    &'a self,
    phone: &'a str,
  ) -> impl Future<Output = Result<Option<Subscriber>, Self::Error>> + Send + 'a;

  /// List subscribers, optionally filtered on the `active` flag, ordered by
  /// creation time.
  fn list_subscribers(
    &self,
    active: Option<bool>,
  ) -> impl Future<Output = Result<Vec<Subscriber>, Self::Error>> + Send + '_;

  /// Stamp `last_sent_at`. Returns `false` if the subscriber does not exist.
  fn record_sent(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Soft-delete (`false`) or restore (`true`). Returns `false` if the
  /// subscriber does not exist.
  fn set_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// One current [`InsightSnapshot`] per subscriber.
pub trait SnapshotStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert or fully overwrite the subscriber's snapshot.
  fn put_snapshot<'a>(
    &'a self,
    snapshot: &'a InsightSnapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_snapshot(
    &self,
    subscriber_id: Uuid,
  ) -> impl Future<Output = Result<Option<InsightSnapshot>, Self::Error>> + Send + '_;
}
