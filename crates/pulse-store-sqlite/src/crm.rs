//! [`CrmMetrics`]: live insight metrics computed from a property CRM
//! database.
//!
//! The CRM is read-only from our side. It is expected to hold two tables:
//!
//! | table | columns used |
//! |-------|--------------|
//! | `sales` | `user_id`, `created_at` |
//! | `listings` | `user_id`, `status`, `price`, `listed_date`, `sold_date` |
//!
//! `user_id` is the subscriber's UUID in hyphenated form. Timestamps may be
//! any format SQLite's `julianday()` understands.
//!
//! Each metric is queried independently. A failing query (missing table,
//! bad column) degrades that metric to `"N/A"` rather than failing the
//! whole mapping.

use std::path::Path;

use pulse_core::{
  insight::{InsightData, MetricValue},
  metrics::MetricSource,
  render::format_amount,
  subscriber::Subscriber,
};

use crate::{Error, Result, encode::encode_uuid};

/// Placeholder for a metric whose query failed or returned nothing.
const UNAVAILABLE: &str = "N/A";

/// Live [`MetricSource`] over a CRM SQLite file.
#[derive(Clone)]
pub struct CrmMetrics {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl CrmMetrics {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  /// Open an empty in-memory CRM, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }
}

impl MetricSource for CrmMetrics {
  type Error = Error;

  async fn generate(&self, subscriber: &Subscriber) -> Result<InsightData> {
    let user_id = encode_uuid(subscriber.subscriber_id);

    let data = self
      .conn
      .call(move |conn| {
        let mut data = InsightData::new();

        let sales_change = sales_change(conn, &user_id).unwrap_or_else(|e| {
          tracing::warn!(error = %e, "could not calculate sales change");
          UNAVAILABLE.to_owned()
        });
        let active_listings = active_listings(conn, &user_id).unwrap_or_else(|e| {
          tracing::warn!(error = %e, "could not count active listings");
          0
        });
        let avg_price = average_price(conn, &user_id).unwrap_or_else(|e| {
          tracing::warn!(error = %e, "could not calculate average price");
          UNAVAILABLE.to_owned()
        });
        let sales_velocity = sales_velocity(conn, &user_id).unwrap_or_else(|e| {
          tracing::warn!(error = %e, "could not calculate sales velocity");
          UNAVAILABLE.to_owned()
        });

        data.insert("sales_change".into(), sales_change.into());
        data.insert("active_listings".into(), MetricValue::from(active_listings));
        data.insert("avg_price".into(), avg_price.into());
        data.insert("sales_velocity".into(), sales_velocity.into());
        Ok(data)
      })
      .await?;

    tracing::debug!(subscriber_id = %subscriber.subscriber_id, "generated CRM insights");
    Ok(data)
  }
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Sales in the last 7 days relative to the 7 days before, as `+12.5%`.
fn sales_change(conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<String> {
  let (current, previous): (i64, i64) = conn.query_row(
    "SELECT
       COUNT(*) FILTER (WHERE julianday(created_at) >= julianday('now', '-7 days')),
       COUNT(*) FILTER (WHERE julianday(created_at) >= julianday('now', '-14 days')
                          AND julianday(created_at) <  julianday('now', '-7 days'))
     FROM sales
     WHERE user_id = ?1",
    rusqlite::params![user_id],
    |row| Ok((row.get(0)?, row.get(1)?)),
  )?;

  Ok(describe_change(current, previous))
}

fn describe_change(current: i64, previous: i64) -> String {
  if previous == 0 {
    return if current > 0 { "+100%".to_owned() } else { "No change".to_owned() };
  }
  let change = (current - previous) as f64 / previous as f64 * 100.0;
  let sign = if change > 0.0 { "+" } else { "" };
  format!("{sign}{change:.1}%")
}

fn active_listings(conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM listings WHERE user_id = ?1 AND status = 'active'",
    rusqlite::params![user_id],
    |row| row.get(0),
  )
}

/// Mean asking price of active listings, rounded to whole rand.
fn average_price(conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<String> {
  let avg: Option<f64> = conn.query_row(
    "SELECT AVG(price) FROM listings WHERE user_id = ?1 AND status = 'active'",
    rusqlite::params![user_id],
    |row| row.get(0),
  )?;

  Ok(match avg {
    Some(avg) if avg != 0.0 => format_amount(avg, 0),
    _ => UNAVAILABLE.to_owned(),
  })
}

/// Mean days from listing to sale for sales closed in the last 90 days.
fn sales_velocity(conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<String> {
  let avg_days: Option<f64> = conn.query_row(
    "SELECT AVG(julianday(sold_date) - julianday(listed_date))
     FROM listings
     WHERE user_id = ?1
       AND status = 'sold'
       AND julianday(sold_date) >= julianday('now', '-90 days')",
    rusqlite::params![user_id],
    |row| row.get(0),
  )?;

  Ok(match avg_days {
    Some(days) if days != 0.0 => format!("{days:.0} days"),
    _ => UNAVAILABLE.to_owned(),
  })
}

#[cfg(test)]
mod tests {
  use super::describe_change;

  #[test]
  fn change_descriptions() {
    assert_eq!(describe_change(3, 0), "+100%");
    assert_eq!(describe_change(0, 0), "No change");
    assert_eq!(describe_change(6, 4), "+50.0%");
    assert_eq!(describe_change(3, 4), "-25.0%");
    assert_eq!(describe_change(4, 4), "0.0%");
  }
}
