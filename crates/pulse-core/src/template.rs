//! Pre-approved template messages.
//!
//! Templates can be delivered outside the provider's 24-hour customer-service
//! window, which is what makes them suitable for scheduled delivery. Only the
//! parameter values travel with each send; the wording lives on the provider.

use serde::{Deserialize, Serialize};

use crate::{insight::InsightData, render::currency_or_verbatim};

/// Placeholder for a template parameter whose metric is missing. Providers
/// reject empty template parameters.
pub const MISSING_VALUE: &str = "N/A";

pub const WEEKLY_INSIGHTS: &str = "weekly_insights";
pub const INSIGHTS_DASHBOARD: &str = "insights_dashboard";

/// A template send request, independent of the provider's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMessage {
  /// Template name as registered with the provider.
  pub name:            String,
  /// Language code, e.g. `en`.
  pub language:        String,
  /// Positional body parameters (`{{1}}`, `{{2}}`, ...).
  pub body_parameters: Vec<String>,
  /// Dynamic suffix for the first URL button, if the template has one.
  pub url_button:      Option<String>,
}

impl TemplateMessage {
  pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
    Self {
      name:            name.into(),
      language:        language.into(),
      body_parameters: Vec::new(),
      url_button:      None,
    }
  }

  pub fn with_parameter(mut self, value: impl Into<String>) -> Self {
    self.body_parameters.push(value.into());
    self
  }

  /// The `weekly_insights` template: name, leads, portal, offers, sales,
  /// revenue, commission.
  pub fn weekly_insights(display_name: &str, data: &InsightData) -> Self {
    let verbatim = |key: &str| {
      data
        .get(key)
        .map(ToString::to_string)
        .unwrap_or_else(|| MISSING_VALUE.to_owned())
    };
    let currency = |key: &str| {
      data
        .get(key)
        .map(currency_or_verbatim)
        .unwrap_or_else(|| MISSING_VALUE.to_owned())
    };

    Self::new(WEEKLY_INSIGHTS, "en")
      .with_parameter(display_name)
      .with_parameter(verbatim("leads"))
      .with_parameter(verbatim("most_active_portal"))
      .with_parameter(verbatim("new_offers"))
      .with_parameter(verbatim("sales"))
      .with_parameter(currency("revenue"))
      .with_parameter(currency("commission"))
  }

  /// The `insights_dashboard` template: a greeting plus an optional
  /// dashboard link button.
  pub fn insights_dashboard(display_name: &str, dashboard_url: Option<&str>) -> Self {
    let mut template = Self::new(INSIGHTS_DASHBOARD, "en").with_parameter(display_name);
    template.url_button = dashboard_url.map(str::to_owned);
    template
  }
}
