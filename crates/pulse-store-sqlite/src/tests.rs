//! Integration tests for `SqliteStore` and `CrmMetrics` against in-memory
//! databases.

use chrono::{Duration, Utc};
use pulse_core::{
  insight::{InsightData, InsightSnapshot, MetricValue},
  metrics::MetricSource,
  store::{SnapshotStore, SubscriberStore},
  subscriber::{Frequency, NewSubscriber},
};
use uuid::Uuid;

use crate::{CrmMetrics, SqliteStore, encode::encode_uuid};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn subscriber(phone: &str, name: &str) -> NewSubscriber {
  NewSubscriber::new(phone, name)
}

// ─── Subscribers ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_subscriber() {
  let s = store().await;

  let mut input = subscriber("27821234567", "Alice");
  input.frequency = Frequency::Monthly;
  let created = s.create_subscriber(input).await.unwrap();
  assert!(created.active);
  assert!(created.last_sent_at.is_none());

  let fetched = s.get_subscriber(created.subscriber_id).await.unwrap().unwrap();
  assert_eq!(fetched.subscriber_id, created.subscriber_id);
  assert_eq!(fetched.phone, "27821234567");
  assert_eq!(fetched.display_name, "Alice");
  assert_eq!(fetched.frequency, Frequency::Monthly);
  assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn get_subscriber_missing_returns_none() {
  let s = store().await;
  assert!(s.get_subscriber(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_phone_exact_match() {
  let s = store().await;
  s.create_subscriber(subscriber("27821234567", "Alice")).await.unwrap();
  s.create_subscriber(subscriber("27831111111", "Bob")).await.unwrap();

  let bob = s.find_by_phone("27831111111").await.unwrap().unwrap();
  assert_eq!(bob.display_name, "Bob");

  assert!(s.find_by_phone("2783111111").await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_phone_returns_first_of_duplicates() {
  let s = store().await;
  let first = s
    .create_subscriber(subscriber("27821234567", "First"))
    .await
    .unwrap();
  s.create_subscriber(subscriber("27821234567", "Second"))
    .await
    .unwrap();

  let found = s.find_by_phone("27821234567").await.unwrap().unwrap();
  assert_eq!(found.subscriber_id, first.subscriber_id);
  assert_eq!(s.list_subscribers(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn list_subscribers_filters_on_active() {
  let s = store().await;
  s.create_subscriber(subscriber("27820000001", "A")).await.unwrap();
  let mut inactive = subscriber("27820000002", "B");
  inactive.active = false;
  s.create_subscriber(inactive).await.unwrap();
  s.create_subscriber(subscriber("27820000003", "C")).await.unwrap();

  let active = s.list_subscribers(Some(true)).await.unwrap();
  assert_eq!(
    active.iter().map(|a| a.display_name.as_str()).collect::<Vec<_>>(),
    ["A", "C"]
  );

  let dormant = s.list_subscribers(Some(false)).await.unwrap();
  assert_eq!(dormant.len(), 1);
  assert_eq!(dormant[0].display_name, "B");

  assert_eq!(s.list_subscribers(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn set_active_toggles_and_reports_missing() {
  let s = store().await;
  let sub = s.create_subscriber(subscriber("27821234567", "A")).await.unwrap();

  assert!(s.set_active(sub.subscriber_id, false).await.unwrap());
  let fetched = s.get_subscriber(sub.subscriber_id).await.unwrap().unwrap();
  assert!(!fetched.active);
  assert!(s.list_subscribers(Some(true)).await.unwrap().is_empty());

  assert!(s.set_active(sub.subscriber_id, true).await.unwrap());
  assert!(s.get_subscriber(sub.subscriber_id).await.unwrap().unwrap().active);

  assert!(!s.set_active(Uuid::new_v4(), false).await.unwrap());
}

#[tokio::test]
async fn record_sent_stamps_last_sent_at() {
  let s = store().await;
  let sub = s.create_subscriber(subscriber("27821234567", "A")).await.unwrap();

  let at = Utc::now();
  assert!(s.record_sent(sub.subscriber_id, at).await.unwrap());

  let fetched = s.get_subscriber(sub.subscriber_id).await.unwrap().unwrap();
  assert_eq!(fetched.last_sent_at, Some(at));
  assert_eq!(fetched.created_at, sub.created_at);

  assert!(!s.record_sent(Uuid::new_v4(), at).await.unwrap());
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

fn sample_data() -> InsightData {
  let mut data = InsightData::new();
  data.insert("leads".into(), MetricValue::Number(230.0));
  data.insert("revenue".into(), "R8mil".into());
  data
}

#[tokio::test]
async fn snapshot_put_and_get() {
  let s = store().await;
  let sub = s.create_subscriber(subscriber("27821234567", "A")).await.unwrap();

  assert!(s.get_snapshot(sub.subscriber_id).await.unwrap().is_none());

  let snapshot = InsightSnapshot::new(sub.subscriber_id, sample_data());
  s.put_snapshot(&snapshot).await.unwrap();

  let fetched = s.get_snapshot(sub.subscriber_id).await.unwrap().unwrap();
  assert_eq!(fetched, snapshot);
}

#[tokio::test]
async fn snapshot_put_overwrites_previous() {
  let s = store().await;
  let sub = s.create_subscriber(subscriber("27821234567", "A")).await.unwrap();

  let mut first = InsightSnapshot::new(sub.subscriber_id, sample_data());
  first.generated_at = Utc::now() - Duration::days(7);
  s.put_snapshot(&first).await.unwrap();

  let mut data = InsightData::new();
  data.insert("sales".into(), MetricValue::Number(2.0));
  let second = InsightSnapshot::new(sub.subscriber_id, data);
  s.put_snapshot(&second).await.unwrap();

  let fetched = s.get_snapshot(sub.subscriber_id).await.unwrap().unwrap();
  assert_eq!(fetched.data.len(), 1);
  assert!(fetched.data.contains_key("sales"));
  assert_eq!(fetched.generated_at, second.generated_at);
}

#[tokio::test]
async fn snapshot_for_unknown_subscriber_is_rejected() {
  let s = store().await;
  let orphan = InsightSnapshot::new(Uuid::new_v4(), sample_data());
  assert!(matches!(
    s.put_snapshot(&orphan).await,
    Err(crate::Error::Database(_))
  ));
}

// ─── CRM metrics ─────────────────────────────────────────────────────────────

const CRM_SCHEMA: &str = "
CREATE TABLE sales (user_id TEXT NOT NULL, created_at TEXT NOT NULL);
CREATE TABLE listings (
  user_id     TEXT NOT NULL,
  status      TEXT NOT NULL,
  price       REAL,
  listed_date TEXT,
  sold_date   TEXT
);
";

async fn crm_with(statements: String) -> CrmMetrics {
  let crm = CrmMetrics::open_in_memory().await.unwrap();
  crm
    .conn
    .call(move |conn| {
      conn.execute_batch(CRM_SCHEMA)?;
      conn.execute_batch(&statements)?;
      Ok(())
    })
    .await
    .unwrap();
  crm
}

async fn sample_subscriber() -> pulse_core::subscriber::Subscriber {
  store()
    .await
    .create_subscriber(subscriber("27821234567", "Agent"))
    .await
    .unwrap()
}

#[tokio::test]
async fn crm_metrics_computed_from_tables() {
  let sub = sample_subscriber().await;
  let uid = encode_uuid(sub.subscriber_id);

  let crm = crm_with(format!(
    "INSERT INTO sales VALUES
       ('{uid}', datetime('now', '-1 days')),
       ('{uid}', datetime('now', '-2 days')),
       ('{uid}', datetime('now', '-3 days')),
       ('{uid}', datetime('now', '-10 days')),
       ('{uid}', datetime('now', '-11 days')),
       ('someone-else', datetime('now', '-1 days'));
     INSERT INTO listings VALUES
       ('{uid}', 'active', 1000000, NULL, NULL),
       ('{uid}', 'active', 2000000, NULL, NULL),
       ('{uid}', 'sold', 900000, datetime('now', '-30 days'), datetime('now', '-10 days')),
       ('{uid}', 'sold', 900000, datetime('now', '-40 days'), datetime('now', '-10 days'));"
  ))
  .await;

  let data = crm.generate(&sub).await.unwrap();
  assert_eq!(data["sales_change"].to_string(), "+50.0%");
  assert_eq!(data["active_listings"], MetricValue::Number(2.0));
  assert_eq!(data["avg_price"].to_string(), "R1,500,000");
  assert_eq!(data["sales_velocity"].to_string(), "25 days");
}

#[tokio::test]
async fn crm_metrics_with_no_rows() {
  let sub = sample_subscriber().await;
  let crm = crm_with(String::new()).await;

  let data = crm.generate(&sub).await.unwrap();
  assert_eq!(data["sales_change"].to_string(), "No change");
  assert_eq!(data["active_listings"], MetricValue::Number(0.0));
  assert_eq!(data["avg_price"].to_string(), "N/A");
  assert_eq!(data["sales_velocity"].to_string(), "N/A");
}

#[tokio::test]
async fn crm_metrics_degrade_when_tables_are_missing() {
  let sub = sample_subscriber().await;
  let crm = CrmMetrics::open_in_memory().await.unwrap();

  let data = crm.generate(&sub).await.unwrap();
  assert_eq!(data["sales_change"].to_string(), "N/A");
  assert_eq!(data["active_listings"], MetricValue::Number(0.0));
  assert_eq!(data["avg_price"].to_string(), "N/A");
  assert_eq!(data["sales_velocity"].to_string(), "N/A");
}
