//! Metric sources: live computation and the mock generator.

use std::future::Future;

use rand::{Rng, seq::SliceRandom};

use crate::{insight::InsightData, subscriber::Subscriber};

/// Produces the current metric mapping for a subscriber.
pub trait MetricSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn generate<'a>(
    &'a self,
    subscriber: &'a Subscriber,
  ) -> impl Future<Output = Result<InsightData, Self::Error>> + Send + 'a;
}

const SALES_CHANGES: [&str; 5] = ["+5%", "+12%", "-3%", "+8%", "+15%"];
const PORTALS: [&str; 4] = ["P24 - 60%", "PP - 45%", "Gumtree - 30%", "Website - 25%"];

/// Synthetic metrics covering every report key. Each value is drawn
/// independently from the thread RNG, so consecutive calls differ.
pub fn mock_insights() -> InsightData {
  let mut rng = rand::thread_rng();
  let mut data = InsightData::new();

  let pick = |rng: &mut rand::rngs::ThreadRng, options: &[&str]| {
    options.choose(rng).copied().unwrap_or_default().to_owned()
  };

  data.insert("leads".into(), rng.gen_range(50_u32..=300).into());
  data.insert("most_active_portal".into(), pick(&mut rng, &PORTALS).into());
  data.insert("new_offers".into(), rng.gen_range(0_u32..=10).into());
  data.insert("sales".into(), rng.gen_range(0_u32..=5).into());
  data.insert("revenue".into(), format!("R{}mil", rng.gen_range(1..=12)).into());
  data.insert("commission".into(), format!("R{}k", rng.gen_range(20..=300)).into());
  data.insert("sales_change".into(), pick(&mut rng, &SALES_CHANGES).into());
  data.insert("active_listings".into(), rng.gen_range(20_u32..=100).into());
  data.insert("avg_price".into(), format!("R{}K", rng.gen_range(300..=800)).into());
  data.insert(
    "sales_velocity".into(),
    format!("{} days", rng.gen_range(10..=30)).into(),
  );
  data
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::render::metric_keys;

  #[test]
  fn mock_covers_every_report_key() {
    let data = mock_insights();
    for key in metric_keys() {
      assert!(data.contains_key(key), "missing {key}");
    }
  }

  #[test]
  fn mock_values_stay_in_range() {
    for _ in 0..50 {
      let data = mock_insights();
      let listings = data["active_listings"].as_number().unwrap();
      assert!((20.0..=100.0).contains(&listings));
      assert!(SALES_CHANGES.contains(&data["sales_change"].to_string().as_str()));
      assert!(data["avg_price"].as_number().is_none());
    }
  }
}
