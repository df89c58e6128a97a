//! Domain records shared across the dashboard core

use anyhow::bail;
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A connected Google account. The token is an opaque bearer credential
/// supplied by the surrounding application; expiry is signalled upstream
/// via `Unauthorized` errors.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub email: String,
    pub token: String,
}

/// A verified Search Console property, tagged with the account whose
/// credential listed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub site_url: String,
    pub permission_level: String,
    pub account_email: String,
}

impl Site {
    pub fn key(&self) -> SiteKey {
        SiteKey {
            account_email: self.account_email.clone(),
            site_url: self.site_url.clone(),
        }
    }
}

/// Composite key for the metrics collection and loading set.
///
/// `site_url` alone is not conflict-free: the same property can be
/// verified under two connected accounts, and both entries coexist.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteKey {
    pub account_email: String,
    pub site_url: String,
}

impl SiteKey {
    pub fn new(account_email: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            account_email: account_email.into(),
            site_url: site_url.into(),
        }
    }
}

impl std::fmt::Display for SiteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.site_url, self.account_email)
    }
}

/// Inclusive calendar-day range, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        if start > end {
            bail!("date range start {start} is after end {end}");
        }
        Ok(Self { start, end })
    }

    /// Range covering the last `days` days up to today (inclusive).
    pub fn last_days(days: u64) -> Self {
        let end = Utc::now().date_naive();
        let start = end.checked_sub_days(Days::new(days)).unwrap_or(end);
        Self { start, end }
    }
}

/// The filter state a batch of requests was dispatched under. In-flight
/// results are discarded when the applied snapshot no longer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSnapshot {
    pub range: DateRange,
    /// Lowercase ISO3-style country code, or `None` for all countries.
    pub country: Option<String>,
}

impl FilterSnapshot {
    pub fn new(range: DateRange, country: Option<String>) -> Self {
        Self { range, country }
    }
}

/// One day of the daily series. `ctr` and `position` arrive already
/// aggregated from upstream and are not recomputed from the raw counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

/// One row of a single-dimension breakdown (query, device, country, page).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionRow {
    pub key: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Week-over-week click trend derived from the daily series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub change_percent: f64,
}

impl Trend {
    pub fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            change_percent: 0.0,
        }
    }
}

/// Aggregated metrics for one site under one filter snapshot.
///
/// `total_clicks` and `total_impressions` come from a dedicated overall
/// query with no dimension breakdown. The breakdown arrays are capped at
/// their row limits and are never summed to produce totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMetrics {
    pub site_url: String,
    pub account_email: String,
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub average_ctr: f64,
    pub average_position: f64,
    pub trend: Trend,
    pub daily_data: Vec<DailyPoint>,
    pub top_queries: Vec<DimensionRow>,
    pub device_breakdown: Vec<DimensionRow>,
    pub country_breakdown: Vec<DimensionRow>,
}

impl SiteMetrics {
    pub fn key(&self) -> SiteKey {
        SiteKey {
            account_email: self.account_email.clone(),
            site_url: self.site_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let start = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        assert!(DateRange::new(start, end).is_err());
        assert!(DateRange::new(end, start).is_ok());
        assert!(DateRange::new(start, start).is_ok());
    }

    #[test]
    fn last_days_spans_requested_window() {
        let range = DateRange::last_days(28);
        assert!(range.start <= range.end);
        assert_eq!((range.end - range.start).num_days(), 28);
    }

    #[test]
    fn site_keys_distinguish_owning_account() {
        let a = SiteKey::new("a@example.com", "https://example.com/");
        let b = SiteKey::new("b@example.com", "https://example.com/");
        assert_ne!(a, b);
    }
}
