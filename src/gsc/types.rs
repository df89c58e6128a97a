//! Wire schema for the Search Console API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::DateRange;

/// Breakdown dimension for a search-analytics query. The order of the
/// requested dimensions determines the arity and order of `ApiRow::keys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Date,
    Query,
    Device,
    Country,
    Page,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionFilter {
    pub dimension: Dimension,
    pub operator: String,
    pub expression: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionFilterGroup {
    pub group_type: String,
    pub filters: Vec<DimensionFilter>,
}

/// Body of a `searchAnalytics/query` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<Dimension>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dimension_filter_groups: Vec<DimensionFilterGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_row: Option<u32>,
}

impl QueryRequest {
    /// Overall query: no dimensions, one aggregate row for the range.
    pub fn overall(range: &DateRange) -> Self {
        Self {
            start_date: range.start,
            end_date: range.end,
            dimensions: Vec::new(),
            dimension_filter_groups: Vec::new(),
            row_limit: Some(1),
            start_row: None,
        }
    }

    /// Single-dimension breakdown query.
    pub fn breakdown(range: &DateRange, dimension: Dimension, row_limit: u32) -> Self {
        Self {
            start_date: range.start,
            end_date: range.end,
            dimensions: vec![dimension],
            dimension_filter_groups: Vec::new(),
            row_limit: Some(row_limit),
            start_row: None,
        }
    }

    /// Add an equality filter on the country dimension.
    pub fn with_country(mut self, code: &str) -> Self {
        self.dimension_filter_groups.push(DimensionFilterGroup {
            group_type: "and".to_string(),
            filters: vec![DimensionFilter {
                dimension: Dimension::Country,
                operator: "equals".to_string(),
                expression: code.to_string(),
            }],
        });
        self
    }
}

/// One analytics row. `keys` holds one entry per requested dimension, in
/// request order; the overall query returns rows with no keys at all.
/// Counts arrive as JSON numbers that may carry a fractional part.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub rows: Vec<ApiRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    #[serde(default)]
    pub permission_level: String,
}

/// An account with zero verified properties gets a response with no
/// `siteEntry` field at all; the default normalizes that to an empty list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitesResponse {
    #[serde(default)]
    pub site_entry: Vec<SiteEntry>,
}

/// Error body shape returned by Google APIs.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}
