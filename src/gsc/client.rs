use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::error::{GscError, GscResult};
use super::types::{ApiErrorBody, ApiRow, QueryRequest, QueryResponse, SiteEntry, SitesResponse};

/// Default base URL of the Search Console API.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/webmasters/v3";

/// Seam between the orchestrator and the upstream API. One instance is
/// bound to one account credential.
#[async_trait]
pub trait SearchConsoleApi: Send + Sync {
    /// List the account's verified properties. Zero properties is an
    /// empty list, not an error.
    async fn list_sites(&self) -> GscResult<Vec<SiteEntry>>;

    /// Run one search-analytics query against a property. No retries;
    /// retry policy belongs to the caller.
    async fn query(&self, site_url: &str, request: &QueryRequest) -> GscResult<Vec<ApiRow>>;
}

/// reqwest-backed client for one account.
pub struct HttpSearchConsole {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpSearchConsole {
    pub fn new(token: &str, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("searchdeck/0.1.0")
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client for Search Console")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl SearchConsoleApi for HttpSearchConsole {
    async fn list_sites(&self) -> GscResult<Vec<SiteEntry>> {
        let url = format!("{}/sites", self.base_url);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| GscError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error(status, body));
        }

        let sites: SitesResponse = response
            .json()
            .await
            .context("failed to parse sites-list response")?;
        Ok(sites.site_entry)
    }

    async fn query(&self, site_url: &str, request: &QueryRequest) -> GscResult<Vec<ApiRow>> {
        let url = format!(
            "{}/sites/{}/searchAnalytics/query",
            self.base_url,
            urlencoding::encode(site_url)
        );
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| GscError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error(status, body));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .context("failed to parse search-analytics response")?;
        Ok(parsed.rows)
    }
}

/// Map an upstream HTTP status to the error taxonomy. The message is
/// pulled from the Google error body when present, falling back to the
/// raw response text.
fn map_error(status: StatusCode, body: String) -> GscError {
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED => GscError::Unauthorized,
        StatusCode::FORBIDDEN => GscError::Forbidden(message),
        StatusCode::NOT_FOUND => GscError::NotFound(message),
        _ => GscError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
