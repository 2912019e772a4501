//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs are hyphenated lowercase strings,
//! and snapshot data is compact JSON.

use chrono::{DateTime, Utc};
use pulse_core::{
  insight::{InsightData, InsightSnapshot},
  subscriber::{Frequency, Subscriber},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSubscriber::from_row`].
pub const SUBSCRIBER_COLUMNS: &str =
  "subscriber_id, phone, display_name, frequency, active, created_at, last_sent_at";

/// Raw values read directly from a `subscribers` row.
pub struct RawSubscriber {
  pub subscriber_id: String,
  pub phone:         String,
  pub display_name:  String,
  pub frequency:     String,
  pub active:        bool,
  pub created_at:    String,
  pub last_sent_at:  Option<String>,
}

impl RawSubscriber {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscriber_id: row.get(0)?,
      phone:         row.get(1)?,
      display_name:  row.get(2)?,
      frequency:     row.get(3)?,
      active:        row.get(4)?,
      created_at:    row.get(5)?,
      last_sent_at:  row.get(6)?,
    })
  }

  pub fn into_subscriber(self) -> Result<Subscriber> {
    Ok(Subscriber {
      subscriber_id: decode_uuid(&self.subscriber_id)?,
      phone:         self.phone,
      display_name:  self.display_name,
      frequency:     self.frequency.parse::<Frequency>()?,
      active:        self.active,
      created_at:    decode_dt(&self.created_at)?,
      last_sent_at:  self.last_sent_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `snapshots` row.
pub struct RawSnapshot {
  pub subscriber_id: String,
  pub generated_at:  String,
  pub data_json:     String,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<InsightSnapshot> {
    let data: InsightData = serde_json::from_str(&self.data_json)?;
    Ok(InsightSnapshot {
      subscriber_id: decode_uuid(&self.subscriber_id)?,
      generated_at:  decode_dt(&self.generated_at)?,
      data,
    })
  }
}
