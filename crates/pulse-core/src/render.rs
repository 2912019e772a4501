//! Message formatting: insight reports and the fixed reply texts.
//!
//! Everything here is pure. The only input that varies between otherwise
//! identical calls is the `today` date embedded in the report footer.

use chrono::NaiveDate;

use crate::insight::{InsightData, MetricValue};

/// Currency symbol prefixed to coerced monetary values.
pub const CURRENCY_SYMBOL: &str = "R";

/// Sent when a registered subscriber asks for insights and something on our
/// side failed.
pub const ERROR_MESSAGE: &str =
  "Sorry, there was an error retrieving your insights. Please try again later.";

// ─── Report layout ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
  Verbatim,
  /// Currency when the value coerces to a number, verbatim otherwise.
  Currency,
  /// Rising/falling glyph chosen by the presence of a `+`.
  Trend,
}

struct Line {
  key:   &'static str,
  emoji: &'static str,
  label: &'static str,
  style: Style,
}

const fn line(
  key: &'static str,
  emoji: &'static str,
  label: &'static str,
  style: Style,
) -> Line {
  Line { key, emoji, label, style }
}

/// Presentation order of the report. Keys outside this table are not
/// rendered.
const LINES: [Line; 10] = [
  line("leads", "📈", "New Leads", Style::Verbatim),
  line("most_active_portal", "🌐", "Top Portal", Style::Verbatim),
  line("new_offers", "💼", "New Offers", Style::Verbatim),
  line("sales", "🏠", "Sales Closed", Style::Verbatim),
  line("revenue", "💰", "Revenue", Style::Currency),
  line("commission", "🎯", "Commission", Style::Currency),
  line("sales_change", "📈", "Sales Change", Style::Trend),
  line("active_listings", "🏘️", "Active Listings", Style::Verbatim),
  line("avg_price", "💵", "Average Price", Style::Currency),
  line("sales_velocity", "⚡", "Sales Velocity", Style::Verbatim),
];

/// The metric keys the report knows about, in presentation order.
pub fn metric_keys() -> impl Iterator<Item = &'static str> {
  LINES.iter().map(|l| l.key)
}

/// Format `value` with thousands separators and `decimals` fraction digits,
/// prefixed with [`CURRENCY_SYMBOL`]. Negative values keep their sign after
/// the symbol (`R-1,234.56`).
pub fn format_amount(value: f64, decimals: usize) -> String {
  let fixed = format!("{:.*}", decimals, value.abs());
  let (int_part, frac_part) = match fixed.split_once('.') {
    Some((i, f)) => (i, Some(f)),
    None => (fixed.as_str(), None),
  };

  let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
  for (i, c) in int_part.chars().enumerate() {
    if i > 0 && (int_part.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(c);
  }
  if let Some(frac) = frac_part {
    grouped.push('.');
    grouped.push_str(frac);
  }

  // A value that rounds to zero is never shown as negative.
  let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
    "-"
  } else {
    ""
  };
  format!("{CURRENCY_SYMBOL}{sign}{grouped}")
}

/// `R1,234.56`.
pub fn format_currency(value: f64) -> String { format_amount(value, 2) }

/// Currency rendering if `value` coerces, otherwise the value as-is.
pub fn currency_or_verbatim(value: &MetricValue) -> String {
  match value.as_number() {
    Some(n) => format_currency(n),
    None => value.to_string(),
  }
}

/// Render the insight report for `display_name`.
///
/// Known keys are emitted in a fixed order regardless of map order; absent
/// keys are skipped. The footer carries `today`.
pub fn insights_message(
  data: &InsightData,
  display_name: &str,
  today: NaiveDate,
) -> String {
  let mut message = String::from("🏡 *Your Weekly Property Report*\n");
  message.push_str(&format!("Hello {display_name}! 👋\n\n"));
  message.push_str("Here's your performance summary:\n\n");

  for line in &LINES {
    let Some(value) = data.get(line.key) else { continue };

    let (emoji, text) = match line.style {
      Style::Verbatim => (line.emoji, value.to_string()),
      Style::Currency => (line.emoji, currency_or_verbatim(value)),
      Style::Trend => {
        let text = value.to_string();
        let emoji = if text.contains('+') { "📈" } else { "📉" };
        (emoji, text)
      }
    };
    message.push_str(&format!("{emoji} *{}:* {text}\n", line.label));
  }

  message.push_str("\n━━━━━━━━━━━━━━━━━\n");
  message.push_str(&format!("📅 {}\n", today.format("%d %B %Y")));
  message.push_str("\n💡 _Reply 'insights' anytime for your latest report_");
  message
}

// ─── Fixed replies ───────────────────────────────────────────────────────────

/// Reply to an insights request when no snapshot has been generated yet.
pub fn no_insights_message(display_name: &str) -> String {
  format!(
    "Hi {display_name}! 👋\n\nNo insights available yet. We'll send your first report soon!"
  )
}

pub fn welcome_message(display_name: &str) -> String {
  format!(
    "👋 Welcome {display_name}!\n\n\
     I'm your Property Insights Assistant. I'll send you weekly reports on your business performance.\n\n\
     *Commands you can use:*\n\
     • `insights` - Get your latest report\n\n\
     You'll receive your first weekly report soon! 📊"
  )
}

pub fn help_message(display_name: Option<&str>) -> String {
  let greeting = match display_name {
    Some(name) => format!("Hi {name}!"),
    None => "Hi there!".to_owned(),
  };
  format!(
    "{greeting} 👋\n\n\
     *Available Commands:*\n\n\
     📊 *insights* - Get your latest insights\n\n\
     Just send me a message anytime and I'll send your latest insights!"
  )
}

pub fn unsubscribe_message(display_name: &str) -> String {
  format!(
    "Sorry to see you go, {display_name}! 👋\n\n\
     You've been unsubscribed from weekly insights."
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 10, 19).unwrap() }

  fn data(pairs: &[(&str, MetricValue)]) -> InsightData {
    pairs
      .iter()
      .map(|(k, v)| ((*k).to_owned(), v.clone()))
      .collect()
  }

  #[test]
  fn currency_formatting() {
    assert_eq!(format_currency(1234.5), "R1,234.50");
    assert_eq!(format_currency(0.0), "R0.00");
    assert_eq!(format_currency(999.999), "R1,000.00");
    assert_eq!(format_currency(1_234_567.891), "R1,234,567.89");
    assert_eq!(format_currency(-1234.5), "R-1,234.50");
    assert_eq!(format_currency(-0.001), "R0.00");
    assert_eq!(format_amount(1_250_000.4, 0), "R1,250,000");
  }

  #[test]
  fn revenue_coerces_numeric_text() {
    let out = insights_message(&data(&[("revenue", "1234.5".into())]), "X", today());
    assert!(out.contains("💰 *Revenue:* R1,234.50\n"), "{out}");
  }

  #[test]
  fn revenue_keeps_non_numeric_text() {
    let out = insights_message(&data(&[("revenue", "R8mil".into())]), "X", today());
    assert!(out.contains("💰 *Revenue:* R8mil\n"), "{out}");
  }

  #[test]
  fn commission_and_avg_price_coerce_numbers() {
    let out = insights_message(
      &data(&[
        ("commission", MetricValue::Number(150000.0)),
        ("avg_price", "R500K".into()),
      ]),
      "X",
      today(),
    );
    assert!(out.contains("🎯 *Commission:* R150,000.00\n"), "{out}");
    assert!(out.contains("💵 *Average Price:* R500K\n"), "{out}");
  }

  #[test]
  fn leads_precede_sales_regardless_of_insertion() {
    let out = insights_message(
      &data(&[("sales", 2_i64.into()), ("leads", 230_i64.into())]),
      "X",
      today(),
    );
    let leads = out.find("New Leads").unwrap();
    let sales = out.find("Sales Closed").unwrap();
    assert!(leads < sales);
    assert!(out.contains("*New Leads:* 230\n"));
  }

  #[test]
  fn sales_change_glyph_follows_sign() {
    let up = insights_message(&data(&[("sales_change", "+12%".into())]), "X", today());
    assert!(up.contains("📈 *Sales Change:* +12%"));

    let down = insights_message(&data(&[("sales_change", "-3%".into())]), "X", today());
    assert!(down.contains("📉 *Sales Change:* -3%"));
  }

  #[test]
  fn absent_and_unknown_keys_are_omitted() {
    let out = insights_message(
      &data(&[("leads", 5_i64.into()), ("generated_at", "2026-10-19".into())]),
      "X",
      today(),
    );
    assert!(!out.contains("Revenue"));
    assert!(!out.contains("N/A"));
    assert!(!out.contains("generated_at"));
  }

  #[test]
  fn output_is_deterministic_and_ends_with_dated_footer() {
    let d = data(&[("leads", 1_i64.into()), ("sales_velocity", "14 days".into())]);
    let a = insights_message(&d, "Alice", today());
    let b = insights_message(&d, "Alice", today());
    assert_eq!(a, b);
    assert!(a.starts_with("🏡 *Your Weekly Property Report*\nHello Alice! 👋"));
    assert!(a.contains("📅 19 October 2026\n"));
    assert!(a.ends_with("_Reply 'insights' anytime for your latest report_"));
  }

  #[test]
  fn help_greets_by_name_when_known() {
    assert!(help_message(Some("Ann")).starts_with("Hi Ann!"));
    assert!(help_message(None).starts_with("Hi there!"));
  }
}
