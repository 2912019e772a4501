//! Subscriber: a person registered to receive insight messages.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, phone};

/// How often the subscriber asked to hear from us. Informational only; the
/// scheduler runs a single weekly pass for everyone.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
  #[default]
  Weekly,
  Daily,
  Monthly,
}

impl Frequency {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Weekly => "weekly",
      Self::Daily => "daily",
      Self::Monthly => "monthly",
    }
  }
}

impl fmt::Display for Frequency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Frequency {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "weekly" => Ok(Self::Weekly),
      "daily" => Ok(Self::Daily),
      "monthly" => Ok(Self::Monthly),
      _ => Err(Error::UnknownFrequency(s.to_owned())),
    }
  }
}

/// A persisted subscriber record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
  pub subscriber_id: Uuid,
  /// Canonical digit string, see [`crate::phone`].
  pub phone:         String,
  pub display_name:  String,
  pub frequency:     Frequency,
  /// Inactive subscribers are skipped by batch delivery and never answered.
  pub active:        bool,
  /// Server-assigned; never changes after creation.
  pub created_at:    DateTime<Utc>,
  /// Set only after a successful outbound send.
  pub last_sent_at:  Option<DateTime<Utc>>,
}

/// Input to [`crate::store::SubscriberStore::create_subscriber`].
/// `subscriber_id` and `created_at` are always set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscriber {
  pub phone:        String,
  pub display_name: String,
  pub frequency:    Frequency,
  pub active:       bool,
}

impl NewSubscriber {
  /// Weekly, active subscriber.
  pub fn new(phone: impl Into<String>, display_name: impl Into<String>) -> Self {
    Self {
      phone:        phone.into(),
      display_name: display_name.into(),
      frequency:    Frequency::default(),
      active:       true,
    }
  }

  /// Canonicalise the phone number and reject it if it is out of range.
  pub fn normalized(mut self) -> Result<Self> {
    let canonical = phone::normalize(&self.phone);
    if !phone::is_valid(&canonical) {
      return Err(Error::InvalidPhone(self.phone));
    }
    self.phone = canonical;
    Ok(self)
  }
}
