//! Insight snapshots and the metric values they carry.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single metric value. Metric sources emit a mix of raw numbers and
/// pre-formatted text (`"+12%"`, `"R8mil"`, `"N/A"`); the formatter decides
/// per key whether to coerce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
  Number(f64),
  Text(String),
}

impl MetricValue {
  /// Numeric view of the value, if it has one. Text is trimmed and parsed;
  /// non-finite results are treated as non-numeric.
  pub fn as_number(&self) -> Option<f64> {
    let n = match self {
      Self::Number(n) => *n,
      Self::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    n.is_finite().then_some(n)
  }
}

impl fmt::Display for MetricValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

impl From<f64> for MetricValue {
  fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<i64> for MetricValue {
  fn from(n: i64) -> Self { Self::Number(n as f64) }
}

impl From<u32> for MetricValue {
  fn from(n: u32) -> Self { Self::Number(f64::from(n)) }
}

impl From<String> for MetricValue {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<&str> for MetricValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

/// Metric name → value. Ordered so serialised snapshots are stable.
pub type InsightData = BTreeMap<String, MetricValue>;

/// The current insight snapshot for one subscriber. A new snapshot replaces
/// the previous one; no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSnapshot {
  pub subscriber_id: Uuid,
  pub generated_at:  DateTime<Utc>,
  pub data:          InsightData,
}

impl InsightSnapshot {
  pub fn new(subscriber_id: Uuid, data: InsightData) -> Self {
    Self { subscriber_id, generated_at: Utc::now(), data }
  }

  pub fn is_empty(&self) -> bool { self.data.is_empty() }
}
