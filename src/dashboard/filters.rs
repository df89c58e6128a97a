//! Draft/applied filter state
//!
//! Separates what is displayed (applied filters, owned by the
//! orchestrator) from what is being edited (the draft). Applying copies
//! draft to applied and refreshes; on a whole-scope failure the applied
//! filters roll back while the draft stays as the user typed it, so a
//! retry needs no retyping.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::dashboard::Orchestrator;
use crate::models::{DateRange, FilterSnapshot};

pub struct FilterController {
    orchestrator: Arc<Orchestrator>,
    draft: RwLock<FilterSnapshot>,
    default_days: u64,
}

impl FilterController {
    /// Canonical default: the last `days` days, all countries.
    pub fn default_snapshot(days: u64) -> FilterSnapshot {
        FilterSnapshot::new(DateRange::last_days(days), None)
    }

    pub fn new(orchestrator: Arc<Orchestrator>, default_days: u64, initial: FilterSnapshot) -> Self {
        Self {
            orchestrator,
            draft: RwLock::new(initial),
            default_days,
        }
    }

    pub async fn draft(&self) -> FilterSnapshot {
        self.draft.read().await.clone()
    }

    pub async fn applied(&self) -> FilterSnapshot {
        self.orchestrator.applied_filters().await
    }

    pub async fn set_draft_range(&self, range: DateRange) {
        self.draft.write().await.range = range;
    }

    /// `None` means all countries; codes are lowercase ISO3-style.
    pub async fn set_draft_country(&self, country: Option<String>) {
        self.draft.write().await.country = country.map(|c| c.to_lowercase());
    }

    /// Copy draft to applied and refresh everything under the new
    /// snapshot. Rolls the applied filters back if the refresh fails for
    /// the whole scope; the draft is left untouched either way.
    pub async fn apply(&self) -> anyhow::Result<()> {
        let next = self.draft.read().await.clone();
        let previous = self.orchestrator.applied_filters().await;

        self.orchestrator.set_applied_filters(next).await;
        match self.orchestrator.refresh_data().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.orchestrator.set_applied_filters(previous).await;
                Err(e)
            }
        }
    }

    /// Set both draft and applied to the canonical default and refresh,
    /// bypassing the draft/apply distinction.
    pub async fn reset(&self) -> anyhow::Result<()> {
        let default = Self::default_snapshot(self.default_days);
        *self.draft.write().await = default.clone();
        self.orchestrator.set_applied_filters(default).await;
        self.orchestrator.refresh_data().await
    }
}
