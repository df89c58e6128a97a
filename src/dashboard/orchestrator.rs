//! Multi-account fan-out with partial-failure isolation
//!
//! One Search Console client per connected account, keyed by email. Site
//! listing and metrics loading fan out across the whole set as
//! concurrent in-flight requests; a single account or site failing never
//! aborts its siblings. The metrics collection and the client map are
//! the only shared mutable state, and both are mutated exclusively
//! through the upsert/replace operations here.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use dashmap::{DashMap, DashSet};
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::analytics::collect_site_metrics;
use crate::gsc::{GscError, GscResult, HttpSearchConsole, SearchConsoleApi};
use crate::models::{Account, FilterSnapshot, Site, SiteKey, SiteMetrics};

pub struct Orchestrator {
    api_base: String,
    timeout: Duration,
    /// One client per connected account, keyed by email.
    clients: RwLock<HashMap<String, Arc<dyn SearchConsoleApi>>>,
    /// Merged site list across all accounts, each tagged with its owner.
    sites: RwLock<Vec<Site>>,
    /// Aggregated metrics, replaced wholesale on reload, never patched.
    metrics: DashMap<SiteKey, SiteMetrics>,
    /// Sites with a metrics load currently in flight.
    loading: DashSet<SiteKey>,
    /// Filter snapshot the displayed data was loaded under. In-flight
    /// results whose snapshot no longer matches are discarded.
    applied: RwLock<FilterSnapshot>,
    /// Most recent whole-scope failure; cleared explicitly by the caller.
    error: RwLock<Option<String>>,
}

impl Orchestrator {
    pub fn new(api_base: &str, timeout: Duration, initial: FilterSnapshot) -> Self {
        Self {
            api_base: api_base.to_string(),
            timeout,
            clients: RwLock::new(HashMap::new()),
            sites: RwLock::new(Vec::new()),
            metrics: DashMap::new(),
            loading: DashSet::new(),
            applied: RwLock::new(initial),
            error: RwLock::new(None),
        }
    }

    /// Connect an account. Adding the same email again replaces its
    /// client, which is how a refreshed token takes effect.
    pub async fn add_account(&self, account: &Account) -> anyhow::Result<()> {
        let client = HttpSearchConsole::new(&account.token, &self.api_base, self.timeout)?;
        self.add_account_client(&account.email, Arc::new(client))
            .await;
        Ok(())
    }

    /// Connect an account with a caller-supplied client (used by tests).
    pub async fn add_account_client(&self, email: &str, client: Arc<dyn SearchConsoleApi>) {
        let replaced = self
            .clients
            .write()
            .await
            .insert(email.to_string(), client)
            .is_some();
        if replaced {
            info!("replaced client for already-connected account {email}");
        } else {
            info!("connected account {email}");
        }
    }

    /// Disconnect an account and drop its sites and metrics.
    pub async fn remove_account(&self, email: &str) -> bool {
        let removed = self.clients.write().await.remove(email).is_some();
        if removed {
            self.sites.write().await.retain(|s| s.account_email != email);
            self.metrics.retain(|key, _| key.account_email != email);
            self.loading.retain(|key| key.account_email != email);
            info!("disconnected account {email}");
        }
        removed
    }

    pub async fn accounts(&self) -> Vec<String> {
        let mut emails: Vec<String> = self.clients.read().await.keys().cloned().collect();
        emails.sort();
        emails
    }

    pub async fn sites(&self) -> Vec<Site> {
        self.sites.read().await.clone()
    }

    pub fn metrics_snapshot(&self) -> Vec<SiteMetrics> {
        self.metrics.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn metrics_for(&self, key: &SiteKey) -> Option<SiteMetrics> {
        self.metrics.get(key).map(|entry| entry.value().clone())
    }

    pub fn loading_sites(&self) -> Vec<SiteKey> {
        self.loading.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn is_loading(&self, key: &SiteKey) -> bool {
        self.loading.contains(key)
    }

    pub async fn applied_filters(&self) -> FilterSnapshot {
        self.applied.read().await.clone()
    }

    pub async fn set_applied_filters(&self, snapshot: FilterSnapshot) {
        *self.applied.write().await = snapshot;
    }

    pub async fn error(&self) -> Option<String> {
        self.error.read().await.clone()
    }

    pub async fn clear_error(&self) {
        *self.error.write().await = None;
    }

    async fn set_error(&self, message: String) {
        warn!("{message}");
        *self.error.write().await = Some(message);
    }

    /// List sites across every connected account concurrently, merge the
    /// successes, and kick off metrics loading for every merged site.
    ///
    /// A failing account contributes zero sites and stays connected for
    /// future retries; only every account failing sets the global error,
    /// in which case the previously-known site list is left untouched.
    pub async fn load_sites(&self) -> Vec<Site> {
        let snapshot = self.applied_filters().await;
        let clients: Vec<(String, Arc<dyn SearchConsoleApi>)> = self
            .clients
            .read()
            .await
            .iter()
            .map(|(email, client)| (email.clone(), Arc::clone(client)))
            .collect();

        if clients.is_empty() {
            debug!("load_sites called with no connected accounts");
            return Vec::new();
        }
        let account_count = clients.len();

        let listings = join_all(clients.into_iter().map(|(email, client)| async move {
            let result = client.list_sites().await;
            (email, result)
        }))
        .await;

        let mut merged: Vec<Site> = Vec::new();
        let mut succeeded = 0usize;
        for (email, result) in listings {
            match result {
                Ok(entries) => {
                    succeeded += 1;
                    merged.extend(entries.into_iter().map(|entry| Site {
                        site_url: entry.site_url,
                        permission_level: entry.permission_level,
                        account_email: email.clone(),
                    }));
                }
                Err(e) => warn!("failed to list sites for {email}: {e}"),
            }
        }

        if succeeded == 0 {
            self.set_error(format!(
                "failed to list sites for all {account_count} connected accounts"
            ))
            .await;
            return Vec::new();
        }

        merged.sort_by(|a, b| {
            (a.account_email.as_str(), a.site_url.as_str())
                .cmp(&(b.account_email.as_str(), b.site_url.as_str()))
        });

        info!(
            "merged {} sites from {succeeded}/{account_count} accounts",
            merged.len()
        );
        *self.sites.write().await = merged.clone();

        // Metrics for sites that no longer appear in any account are gone.
        let keys: HashSet<SiteKey> = merged.iter().map(Site::key).collect();
        self.metrics.retain(|key, _| keys.contains(key));

        // Mark every merged site loading before anything is dispatched so
        // the UI never sees a known site without a row state.
        for site in &merged {
            self.loading.insert(site.key());
        }
        join_all(
            merged
                .iter()
                .map(|site| self.load_one(site.clone(), snapshot.clone())),
        )
        .await;

        merged
    }

    /// Load metrics for one site, resolved by URL to its owning account.
    /// An unknown URL is a no-op. Explicit filters override the applied
    /// snapshot for this load; by default the applied snapshot is used.
    ///
    /// This single-site operation is whole-scope, so its failure sets the
    /// global error.
    pub async fn load_site_metrics(&self, site_url: &str, filters: Option<FilterSnapshot>) {
        let site = {
            let sites = self.sites.read().await;
            sites.iter().find(|s| s.site_url == site_url).cloned()
        };
        let Some(site) = site else {
            debug!("load_site_metrics for unknown site {site_url}, ignoring");
            return;
        };

        let snapshot = match filters {
            Some(snapshot) => snapshot,
            None => self.applied_filters().await,
        };

        self.loading.insert(site.key());
        let key = site.key();
        if let Err(e) = self.load_one(site, snapshot).await {
            self.set_error(format!("failed to load metrics for {key}: {e}"))
                .await;
        }
    }

    /// Re-load metrics for every known site concurrently. Per-site
    /// failures leave that site's previous metrics in place (stale data
    /// beats a blank row); only every site failing is a whole-scope
    /// failure.
    pub async fn refresh_data(&self) -> anyhow::Result<()> {
        let snapshot = self.applied_filters().await;
        let sites = self.sites.read().await.clone();
        if sites.is_empty() {
            return Ok(());
        }
        let total = sites.len();

        for site in &sites {
            self.loading.insert(site.key());
        }
        let results = join_all(
            sites
                .into_iter()
                .map(|site| self.load_one(site, snapshot.clone())),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed == total {
            let message = format!("refresh failed for all {total} sites");
            self.set_error(message.clone()).await;
            bail!(message);
        }
        Ok(())
    }

    /// Run one site's aggregation and upsert the result. The loading flag
    /// is cleared exactly once, on success, failure or discard. A result
    /// whose originating snapshot no longer matches the applied filters is
    /// dropped so a slow stale batch can never overwrite a newer one.
    async fn load_one(&self, site: Site, snapshot: FilterSnapshot) -> GscResult<()> {
        let key = site.key();
        let result = self.collect_for(&site, &snapshot).await;
        self.loading.remove(&key);

        match result {
            Ok(metrics) => {
                if *self.applied.read().await == snapshot {
                    self.metrics.insert(key, metrics);
                } else {
                    debug!("discarding stale metrics for {key}");
                }
                Ok(())
            }
            Err(e) => {
                warn!("metrics load failed for {key}: {e}");
                Err(e)
            }
        }
    }

    async fn collect_for(&self, site: &Site, snapshot: &FilterSnapshot) -> GscResult<SiteMetrics> {
        let client = {
            let clients = self.clients.read().await;
            clients.get(&site.account_email).cloned()
        };
        let Some(client) = client else {
            return Err(GscError::Other(anyhow::anyhow!(
                "no client for account {}",
                site.account_email
            )));
        };

        collect_site_metrics(
            client.as_ref(),
            site,
            &snapshot.range,
            snapshot.country.as_deref(),
        )
        .await
    }
}
