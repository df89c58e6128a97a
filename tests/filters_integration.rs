//! Integration tests for the draft/applied filter controller

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use searchdeck::dashboard::{FilterController, Orchestrator};
use searchdeck::gsc::{ApiRow, GscError, GscResult, QueryRequest, SearchConsoleApi, SiteEntry};
use searchdeck::models::{DateRange, FilterSnapshot};

struct FakeAccount {
    fail_queries: AtomicBool,
}

impl FakeAccount {
    fn healthy() -> Arc<Self> {
        Arc::new(Self {
            fail_queries: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl SearchConsoleApi for FakeAccount {
    async fn list_sites(&self) -> GscResult<Vec<SiteEntry>> {
        Ok(vec![SiteEntry {
            site_url: "https://example.com/".to_string(),
            permission_level: "siteOwner".to_string(),
        }])
    }

    async fn query(&self, _site_url: &str, request: &QueryRequest) -> GscResult<Vec<ApiRow>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(GscError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        if request.dimensions.is_empty() {
            Ok(vec![ApiRow {
                keys: Vec::new(),
                clicks: 42.0,
                impressions: 420.0,
                ctr: 0.1,
                position: 4.2,
            }])
        } else {
            Ok(Vec::new())
        }
    }
}

fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
    DateRange::new(
        chrono::NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
        chrono::NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
    )
    .unwrap()
}

async fn setup(account: Arc<FakeAccount>) -> (Arc<Orchestrator>, FilterController) {
    let initial = FilterController::default_snapshot(28);
    let orch = Arc::new(Orchestrator::new(
        "http://stub.invalid",
        Duration::from_secs(5),
        initial.clone(),
    ));
    orch.add_account_client("owner@example.com", account).await;
    orch.load_sites().await;

    let controller = FilterController::new(Arc::clone(&orch), 28, initial);
    (orch, controller)
}

#[tokio::test]
async fn apply_copies_draft_to_applied_and_refreshes() {
    let (orch, controller) = setup(FakeAccount::healthy()).await;

    let edited = range((2026, 6, 1), (2026, 6, 30));
    controller.set_draft_range(edited).await;
    controller.set_draft_country(Some("DEU".to_string())).await;

    controller.apply().await.unwrap();

    let applied = controller.applied().await;
    assert_eq!(applied.range, edited);
    // Country codes normalize to lowercase at the edit boundary.
    assert_eq!(applied.country.as_deref(), Some("deu"));
    assert_eq!(applied, controller.draft().await);
    assert_eq!(orch.metrics_snapshot().len(), 1);
}

#[tokio::test]
async fn failed_apply_rolls_back_applied_but_keeps_draft() {
    let account = FakeAccount::healthy();
    let (orch, controller) = setup(Arc::clone(&account)).await;
    let before = controller.applied().await;

    let edited = range((2026, 6, 1), (2026, 6, 30));
    controller.set_draft_range(edited).await;
    account.fail_queries.store(true, Ordering::SeqCst);

    assert!(controller.apply().await.is_err());

    // Applied rolls back; the draft stays as typed for a retry.
    assert_eq!(controller.applied().await, before);
    assert_eq!(controller.draft().await.range, edited);
    assert!(orch.error().await.is_some());

    // Retry after the outage succeeds without retyping.
    account.fail_queries.store(false, Ordering::SeqCst);
    controller.apply().await.unwrap();
    assert_eq!(controller.applied().await.range, edited);
}

#[tokio::test]
async fn reset_restores_default_range_for_both_copies() {
    let (_orch, controller) = setup(FakeAccount::healthy()).await;

    controller
        .set_draft_range(range((2026, 1, 1), (2026, 1, 2)))
        .await;
    controller.set_draft_country(Some("jpn".to_string())).await;
    controller.apply().await.unwrap();

    controller.reset().await.unwrap();

    let expected = FilterController::default_snapshot(28);
    let applied = controller.applied().await;
    assert_eq!(applied, controller.draft().await);
    assert_eq!(applied.country, None);
    assert_eq!(
        (applied.range.end - applied.range.start).num_days(),
        (expected.range.end - expected.range.start).num_days()
    );
}

#[tokio::test]
async fn editing_draft_does_not_touch_applied() {
    let (_orch, controller) = setup(FakeAccount::healthy()).await;
    let before = controller.applied().await;

    controller
        .set_draft_range(range((2026, 2, 1), (2026, 2, 28)))
        .await;
    controller.set_draft_country(Some("gbr".to_string())).await;

    assert_eq!(controller.applied().await, before);
    assert_ne!(controller.draft().await, before);
}

#[tokio::test]
async fn default_snapshot_is_28_days_all_countries() {
    let snapshot = FilterController::default_snapshot(28);
    assert_eq!(snapshot.country, None);
    assert_eq!(
        (snapshot.range.end - snapshot.range.start).num_days(),
        28
    );
}

#[tokio::test]
async fn apply_failure_discards_any_metrics_from_the_failed_batch() {
    // All queries fail, so nothing new lands; the pre-apply metrics from
    // the initial load remain visible under the rolled-back filters.
    let account = FakeAccount::healthy();
    let (orch, controller) = setup(Arc::clone(&account)).await;
    let before: Vec<_> = orch.metrics_snapshot();
    assert_eq!(before.len(), 1);

    account.fail_queries.store(true, Ordering::SeqCst);
    controller
        .set_draft_range(range((2026, 3, 1), (2026, 3, 31)))
        .await;
    assert!(controller.apply().await.is_err());

    let after = orch.metrics_snapshot();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].total_clicks, before[0].total_clicks);

    let snapshot = FilterSnapshot::new(range((2026, 3, 1), (2026, 3, 31)), None);
    assert_ne!(controller.applied().await, snapshot);
}
