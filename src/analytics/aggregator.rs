//! Per-site metric aggregation
//!
//! For one site + date range + optional country filter, issues the five
//! required queries concurrently and assembles one `SiteMetrics`. The
//! overall query is essential; every other slice degrades to an empty
//! array on failure so a single broken breakdown never hides the totals.

use chrono::NaiveDate;
use tracing::warn;

use crate::gsc::{
    ApiRow, Dimension, GscResult, QueryRequest, SearchConsoleApi, DEVICE_ROW_LIMIT, TOP_ROW_LIMIT,
};
use crate::models::{
    DailyPoint, DateRange, DimensionRow, Site, SiteMetrics, Trend, TrendDirection,
};

/// Row limit for the daily series; a date breakdown returns at most one
/// row per day in the range, so this is never the binding constraint.
const DAILY_ROW_LIMIT: u32 = 1000;

/// Number of trailing daily points the trend window looks at.
const TREND_WINDOW: usize = 14;

/// Absolute percent change below which a trend counts as stable.
const STABLE_THRESHOLD: f64 = 5.0;

/// Load and aggregate all metrics for one site.
///
/// When `country` is set, every query carries an equality filter on the
/// country dimension and the country breakdown is skipped entirely.
pub async fn collect_site_metrics(
    api: &dyn SearchConsoleApi,
    site: &Site,
    range: &DateRange,
    country: Option<&str>,
) -> GscResult<SiteMetrics> {
    let filtered = |request: QueryRequest| match country {
        Some(code) => request.with_country(code),
        None => request,
    };

    let overall_req = filtered(QueryRequest::overall(range));
    let daily_req = filtered(QueryRequest::breakdown(
        range,
        Dimension::Date,
        DAILY_ROW_LIMIT,
    ));
    let queries_req = filtered(QueryRequest::breakdown(range, Dimension::Query, TOP_ROW_LIMIT));
    let devices_req = filtered(QueryRequest::breakdown(
        range,
        Dimension::Device,
        DEVICE_ROW_LIMIT,
    ));
    let countries_req = QueryRequest::breakdown(range, Dimension::Country, TOP_ROW_LIMIT);

    let url = &site.site_url;
    let (overall, daily, queries, devices, countries) = tokio::join!(
        api.query(url, &overall_req),
        api.query(url, &daily_req),
        api.query(url, &queries_req),
        api.query(url, &devices_req),
        async {
            match country {
                // Breakdown by country is redundant under a country filter.
                Some(_) => Ok(Vec::new()),
                None => api.query(url, &countries_req).await,
            }
        },
    );

    // Without totals there is nothing meaningful to report.
    let overall_row = overall?.into_iter().next().unwrap_or_default();

    let mut daily_data = to_daily_points(degrade(daily, url, "daily"));
    daily_data.sort_by_key(|point| point.date);
    let trend = compute_trend(&daily_data);

    Ok(SiteMetrics {
        site_url: site.site_url.clone(),
        account_email: site.account_email.clone(),
        total_clicks: as_count(overall_row.clicks),
        total_impressions: as_count(overall_row.impressions),
        average_ctr: overall_row.ctr,
        average_position: overall_row.position,
        trend,
        daily_data,
        top_queries: to_breakdown(degrade(queries, url, "queries")),
        device_breakdown: to_breakdown(degrade(devices, url, "devices")),
        country_breakdown: to_breakdown(degrade(countries, url, "countries")),
    })
}

/// Week-over-week click trend: the most recent 7 daily points against the
/// preceding 7. Too little history, an empty half, or a zero previous
/// average all report stable so a brand-new site never shows a spurious
/// direction.
pub fn compute_trend(daily: &[DailyPoint]) -> Trend {
    if daily.len() < 2 {
        return Trend::stable();
    }

    let window = &daily[daily.len().saturating_sub(TREND_WINDOW)..];
    let split = window.len().saturating_sub(7);
    let (previous, recent) = window.split_at(split);
    if previous.is_empty() || recent.is_empty() {
        return Trend::stable();
    }

    let previous_avg = avg_clicks(previous);
    if previous_avg == 0.0 {
        return Trend::stable();
    }
    let recent_avg = avg_clicks(recent);

    let change = (recent_avg - previous_avg) / previous_avg * 100.0;
    let change_percent = (change * 10.0).round() / 10.0;

    let direction = if change_percent.abs() < STABLE_THRESHOLD {
        TrendDirection::Stable
    } else if change_percent > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    Trend {
        direction,
        change_percent,
    }
}

fn avg_clicks(points: &[DailyPoint]) -> f64 {
    points.iter().map(|p| p.clicks as f64).sum::<f64>() / points.len() as f64
}

/// Downgrade a failed non-essential slice to an empty row set.
fn degrade(result: GscResult<Vec<ApiRow>>, site_url: &str, slice: &str) -> Vec<ApiRow> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            warn!("{slice} query failed for {site_url}: {e}");
            Vec::new()
        }
    }
}

fn to_daily_points(rows: Vec<ApiRow>) -> Vec<DailyPoint> {
    rows.into_iter()
        .filter_map(|row| {
            let key = row.keys.first()?;
            match NaiveDate::parse_from_str(key, "%Y-%m-%d") {
                Ok(date) => Some(DailyPoint {
                    date,
                    clicks: as_count(row.clicks),
                    impressions: as_count(row.impressions),
                    ctr: row.ctr,
                    position: row.position,
                }),
                Err(_) => {
                    warn!("skipping daily row with unparsable date key '{key}'");
                    None
                }
            }
        })
        .collect()
}

/// Upstream relevance ordering is preserved; rows are never re-sorted here.
fn to_breakdown(rows: Vec<ApiRow>) -> Vec<DimensionRow> {
    rows.into_iter()
        .map(|row| DimensionRow {
            key: row.keys.into_iter().next().unwrap_or_default(),
            clicks: as_count(row.clicks),
            impressions: as_count(row.impressions),
            ctr: row.ctr,
            position: row.position,
        })
        .collect()
}

fn as_count(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(clicks: &[u64]) -> Vec<DailyPoint> {
        clicks
            .iter()
            .enumerate()
            .map(|(i, &c)| DailyPoint {
                date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap() + chrono::Days::new(i as u64),
                clicks: c,
                impressions: c * 10,
                ctr: 0.1,
                position: 5.0,
            })
            .collect()
    }

    #[test]
    fn doubling_clicks_is_a_full_up_trend() {
        let points = daily(&[10, 10, 10, 10, 10, 10, 10, 20, 20, 20, 20, 20, 20, 20]);
        let trend = compute_trend(&points);
        assert_eq!(trend.direction, TrendDirection::Up);
        assert_eq!(trend.change_percent, 100.0);
    }

    #[test]
    fn flat_series_is_stable() {
        let points = daily(&[10; 14]);
        let trend = compute_trend(&points);
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.change_percent, 0.0);
    }

    #[test]
    fn under_two_points_is_stable_regardless_of_values() {
        assert_eq!(compute_trend(&[]), Trend::stable());
        assert_eq!(compute_trend(&daily(&[5000])), Trend::stable());
    }

    #[test]
    fn zero_previous_average_is_stable() {
        // New site: no history, then traffic appears.
        let points = daily(&[0, 0, 0, 0, 0, 0, 0, 30, 30, 30, 30, 30, 30, 30]);
        assert_eq!(compute_trend(&points), Trend::stable());
    }

    #[test]
    fn short_history_compares_available_halves() {
        // 10 points: previous 3 vs recent 7.
        let points = daily(&[10, 10, 10, 20, 20, 20, 20, 20, 20, 20]);
        let trend = compute_trend(&points);
        assert_eq!(trend.direction, TrendDirection::Up);
        assert_eq!(trend.change_percent, 100.0);
    }

    #[test]
    fn seven_or_fewer_points_is_stable() {
        // No previous half exists yet.
        let points = daily(&[10, 20, 30, 40, 50]);
        assert_eq!(compute_trend(&points), Trend::stable());
    }

    #[test]
    fn small_change_classifies_stable() {
        let points = daily(&[100, 100, 100, 100, 100, 100, 100, 104, 104, 104, 104, 104, 104, 104]);
        let trend = compute_trend(&points);
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.change_percent, 4.0);
    }

    #[test]
    fn decline_classifies_down() {
        let points = daily(&[100, 100, 100, 100, 100, 100, 100, 50, 50, 50, 50, 50, 50, 50]);
        let trend = compute_trend(&points);
        assert_eq!(trend.direction, TrendDirection::Down);
        assert_eq!(trend.change_percent, -50.0);
    }

    #[test]
    fn trend_window_ignores_older_history() {
        // 20 points; the first 6 are huge but fall outside the window.
        let mut clicks = vec![9999; 6];
        clicks.extend_from_slice(&[10, 10, 10, 10, 10, 10, 10, 20, 20, 20, 20, 20, 20, 20]);
        let trend = compute_trend(&daily(&clicks));
        assert_eq!(trend.direction, TrendDirection::Up);
        assert_eq!(trend.change_percent, 100.0);
    }
}
