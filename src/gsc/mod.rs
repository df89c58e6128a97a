//! Search Console API client
//!
//! Wraps the search-analytics query endpoint and the sites-list endpoint
//! behind one typed boundary. Response-shape ambiguity is normalized here;
//! nothing upstream of this module sees a raw API payload.

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpSearchConsole, SearchConsoleApi};
pub use error::{GscError, GscResult};
pub use types::{ApiRow, Dimension, QueryRequest, SiteEntry};

/// Row limit for query, page and country breakdowns.
pub const TOP_ROW_LIMIT: u32 = 20;

/// Row limit for the device breakdown.
pub const DEVICE_ROW_LIMIT: u32 = 10;
