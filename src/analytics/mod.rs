//! Metric aggregation and scoring
//!
//! Folds raw per-dimension Search Console rows into one `SiteMetrics`
//! record per site, and derives the normalized cross-site performance
//! score used for ranking and colour-coding.

pub mod aggregator;
pub mod scoring;

pub use aggregator::{collect_site_metrics, compute_trend};
pub use scoring::{score_sites, sort_metrics, ScoredSite, SortKey};
