//! Weekly schedule for batch delivery.

use std::future::Future;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveTime, TimeDelta, Utc, Weekday};

use crate::{Error, ScheduleConfig, error::Result};

/// A weekday and wall-clock time in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
  weekday: Weekday,
  time:    NaiveTime,
  offset:  FixedOffset,
}

impl Schedule {
  pub fn new(weekday: Weekday, time: NaiveTime, offset: FixedOffset) -> Self {
    Self { weekday, time, offset }
  }

  pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
    let time = NaiveTime::parse_from_str(config.time.trim(), "%H:%M")
      .map_err(|e| Error::Schedule(format!("time {:?}: {e}", config.time)))?;
    let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
      Error::Schedule(format!("utc offset out of range: {} minutes", config.utc_offset_minutes))
    })?;
    Ok(Self::new(config.weekday, time, offset))
  }

  /// The first scheduled instant strictly after `now`.
  pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    let local = now.with_timezone(&self.offset).naive_local();
    let days_ahead = (7 + self.weekday.num_days_from_monday()
      - local.weekday().num_days_from_monday())
      % 7;

    let mut candidate = local
      .date()
      .checked_add_days(Days::new(u64::from(days_ahead)))
      .unwrap_or(local.date())
      .and_time(self.time);
    if candidate <= local {
      candidate += TimeDelta::weeks(1);
    }

    let utc = candidate - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()));
    utc.and_utc()
  }
}

/// Run `job` at every scheduled instant, forever.
pub async fn run_weekly<F, Fut>(schedule: Schedule, mut job: F)
where
  F: FnMut() -> Fut,
  Fut: Future<Output = ()>,
{
  loop {
    let now = Utc::now();
    let next = schedule.next_run_after(now);
    tracing::info!(next_run = %next, "waiting for next scheduled batch");

    let wait = (next - now).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;
    job().await;
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn monday_nine() -> Schedule {
    Schedule::from_config(&ScheduleConfig::default()).unwrap()
  }

  fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
  }

  #[test]
  fn same_day_before_time() {
    // Monday 08:00 at +02:00.
    let next = monday_nine().next_run_after(utc(2026, 10, 19, 6, 0));
    assert_eq!(next, utc(2026, 10, 19, 7, 0));
  }

  #[test]
  fn exactly_on_time_moves_to_next_week() {
    let next = monday_nine().next_run_after(utc(2026, 10, 19, 7, 0));
    assert_eq!(next, utc(2026, 10, 26, 7, 0));
  }

  #[test]
  fn later_in_week_wraps_around() {
    // Tuesday.
    assert_eq!(monday_nine().next_run_after(utc(2026, 10, 20, 12, 0)), utc(2026, 10, 26, 7, 0));
    // Sunday evening.
    assert_eq!(monday_nine().next_run_after(utc(2026, 10, 25, 20, 0)), utc(2026, 10, 26, 7, 0));
  }

  #[test]
  fn offset_can_shift_the_local_day() {
    // Sunday 23:00 UTC is already Monday 01:00 at +02:00.
    assert_eq!(monday_nine().next_run_after(utc(2026, 10, 25, 23, 0)), utc(2026, 10, 26, 7, 0));

    let utc_friday = Schedule::new(
      Weekday::Fri,
      NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
      FixedOffset::east_opt(0).unwrap(),
    );
    assert_eq!(utc_friday.next_run_after(utc(2026, 10, 19, 0, 0)), utc(2026, 10, 23, 17, 30));
  }

  #[test]
  fn rejects_bad_config() {
    let bad_time = ScheduleConfig { time: "9am".into(), ..ScheduleConfig::default() };
    assert!(Schedule::from_config(&bad_time).is_err());

    let bad_offset = ScheduleConfig { utc_offset_minutes: 24 * 60, ..ScheduleConfig::default() };
    assert!(Schedule::from_config(&bad_offset).is_err());
  }
}
