//! Cross-site performance scoring
//!
//! Derives a comparable 0..1 score from heterogeneous per-site metrics,
//! maps it into a fixed colour palette, and provides the multi-key sort
//! used for the default ranking.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::SiteMetrics;

/// Ordered worst-to-best palette; a normalized score indexes into it.
pub const PALETTE: [&str; 10] = [
    "#7f1d1d", "#b91c1c", "#dc2626", "#ea580c", "#f59e0b", "#eab308", "#84cc16", "#22c55e",
    "#16a34a", "#15803d",
];

/// Colour for sites excluded from the normalization domain (no traffic).
pub const NEUTRAL_COLOUR: &str = "#6b7280";

/// User-facing sort keys. The uniform rule is "descending = best";
/// position inverts internally because lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Clicks,
    Impressions,
    Position,
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::Clicks
    }
}

/// One site's metrics with its derived score and colour attached.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSite {
    #[serde(flatten)]
    pub metrics: SiteMetrics,
    /// Normalized 0..1 score; `None` for sites outside the domain.
    pub score: Option<f64>,
    pub colour: String,
}

fn raw_score(metrics: &SiteMetrics) -> f64 {
    metrics.total_clicks as f64 * metrics.average_ctr + metrics.total_impressions as f64 * 0.1
}

fn qualifies(metrics: &SiteMetrics) -> bool {
    metrics.total_clicks > 0 && metrics.total_impressions > 0
}

/// Score every site against the full collection. Input order is preserved;
/// sites without traffic get no score and the neutral colour.
pub fn score_sites(metrics: Vec<SiteMetrics>) -> Vec<ScoredSite> {
    let raw: Vec<Option<f64>> = metrics
        .iter()
        .map(|m| qualifies(m).then(|| raw_score(m)))
        .collect();

    let domain: Vec<f64> = raw.iter().filter_map(|r| *r).collect();
    let min = domain.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = domain.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    metrics
        .into_iter()
        .zip(raw)
        .map(|(m, raw)| match raw {
            Some(value) => {
                // Flat domain means every qualifying site is tied.
                let normalized = if max > min {
                    (value - min) / (max - min)
                } else {
                    0.5
                };
                ScoredSite {
                    metrics: m,
                    score: Some(normalized),
                    colour: PALETTE[palette_index(normalized)].to_string(),
                }
            }
            None => ScoredSite {
                metrics: m,
                score: None,
                colour: NEUTRAL_COLOUR.to_string(),
            },
        })
        .collect()
}

fn palette_index(normalized: f64) -> usize {
    ((normalized * 9.0).floor() as isize).clamp(0, 9) as usize
}

/// Sort metrics so the best site comes first for the given key.
pub fn sort_metrics(metrics: &mut [SiteMetrics], key: SortKey) {
    match key {
        SortKey::Clicks => metrics.sort_by(|a, b| b.total_clicks.cmp(&a.total_clicks)),
        SortKey::Impressions => {
            metrics.sort_by(|a, b| b.total_impressions.cmp(&a.total_impressions))
        }
        // Lower position is better, so ascending keeps "first = best".
        SortKey::Position => metrics.sort_by(|a, b| {
            a.average_position
                .partial_cmp(&b.average_position)
                .unwrap_or(Ordering::Equal)
        }),
    }
}
