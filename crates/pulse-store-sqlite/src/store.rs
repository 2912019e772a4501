//! [`SqliteStore`]: the SQLite implementation of [`SubscriberStore`] and
//! [`SnapshotStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use pulse_core::{
  insight::InsightSnapshot,
  store::{SnapshotStore, SubscriberStore},
  subscriber::{NewSubscriber, Subscriber},
};

use crate::{
  Error, Result,
  encode::{RawSnapshot, RawSubscriber, SUBSCRIBER_COLUMNS, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Subscriber and snapshot storage backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every trait
/// method is a single `call` on the connection thread, so no lock is ever
/// held across an await point.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run an `UPDATE subscribers ...` keyed on `?1 = subscriber_id` and report
  /// whether a row matched.
  async fn update_subscriber(
    &self,
    sql: &'static str,
    id: Uuid,
    value: rusqlite::types::Value,
  ) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params![id_str, value])?))
      .await?;
    Ok(changed > 0)
  }
}

// ─── SubscriberStore impl ────────────────────────────────────────────────────

impl SubscriberStore for SqliteStore {
  type Error = Error;

  async fn create_subscriber(&self, input: NewSubscriber) -> Result<Subscriber> {
    let subscriber = Subscriber {
      subscriber_id: Uuid::new_v4(),
      phone:         input.phone,
      display_name:  input.display_name,
      frequency:     input.frequency,
      active:        input.active,
      created_at:    Utc::now(),
      last_sent_at:  None,
    };

    let id_str    = encode_uuid(subscriber.subscriber_id);
    let phone     = subscriber.phone.clone();
    let name      = subscriber.display_name.clone();
    let frequency = subscriber.frequency.as_str();
    let active    = subscriber.active;
    let at_str    = encode_dt(subscriber.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscribers (
             subscriber_id, phone, display_name, frequency, active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, phone, name, frequency, active, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(subscriber)
  }

  async fn get_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubscriber> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE subscriber_id = ?1"),
            rusqlite::params![id_str],
            RawSubscriber::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubscriber::into_subscriber).transpose()
  }

  async fn find_by_phone(&self, phone: &str) -> Result<Option<Subscriber>> {
    let phone = phone.to_owned();

    let raw: Option<RawSubscriber> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers
               WHERE phone = ?1
               ORDER BY created_at, rowid
               LIMIT 1"
            ),
            rusqlite::params![phone],
            RawSubscriber::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubscriber::into_subscriber).transpose()
  }

  async fn list_subscribers(&self, active: Option<bool>) -> Result<Vec<Subscriber>> {
    let raws: Vec<RawSubscriber> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(flag) = active {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers
             WHERE active = ?1
             ORDER BY created_at, rowid"
          ))?;
          stmt
            .query_map(rusqlite::params![flag], RawSubscriber::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers ORDER BY created_at, rowid"
          ))?;
          stmt
            .query_map([], RawSubscriber::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscriber::into_subscriber).collect()
  }

  async fn record_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    self
      .update_subscriber(
        "UPDATE subscribers SET last_sent_at = ?2 WHERE subscriber_id = ?1",
        id,
        rusqlite::types::Value::Text(encode_dt(at)),
      )
      .await
  }

  async fn set_active(&self, id: Uuid, active: bool) -> Result<bool> {
    self
      .update_subscriber(
        "UPDATE subscribers SET active = ?2 WHERE subscriber_id = ?1",
        id,
        rusqlite::types::Value::Integer(i64::from(active)),
      )
      .await
  }
}

// ─── SnapshotStore impl ──────────────────────────────────────────────────────

impl SnapshotStore for SqliteStore {
  type Error = Error;

  async fn put_snapshot(&self, snapshot: &InsightSnapshot) -> Result<()> {
    let id_str   = encode_uuid(snapshot.subscriber_id);
    let at_str   = encode_dt(snapshot.generated_at);
    let data_str = serde_json::to_string(&snapshot.data)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO snapshots (subscriber_id, generated_at, data_json)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (subscriber_id) DO UPDATE SET
             generated_at = excluded.generated_at,
             data_json    = excluded.data_json",
          rusqlite::params![id_str, at_str, data_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_snapshot(&self, subscriber_id: Uuid) -> Result<Option<InsightSnapshot>> {
    let id_str = encode_uuid(subscriber_id);

    let raw: Option<RawSnapshot> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT subscriber_id, generated_at, data_json
             FROM snapshots WHERE subscriber_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawSnapshot {
                subscriber_id: row.get(0)?,
                generated_at:  row.get(1)?,
                data_json:     row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSnapshot::into_snapshot).transpose()
  }
}
