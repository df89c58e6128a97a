use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analytics::{score_sites, sort_metrics, ScoredSite, SortKey};
use crate::dashboard::{FilterController, Orchestrator};
use crate::models::{Account, DateRange, FilterSnapshot, Site, SiteKey};

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub filters: Arc<FilterController>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize)]
pub struct SiteRow {
    #[serde(flatten)]
    pub site: Site,
    pub loading: bool,
    pub has_metrics: bool,
}

#[derive(Serialize)]
pub struct SitesResponse {
    pub sites: Vec<SiteRow>,
    pub total: usize,
}

/// List all known sites with their per-row load state.
pub async fn list_sites(State(state): State<Arc<AppState>>) -> Json<SitesResponse> {
    let sites = state.orchestrator.sites().await;
    let rows: Vec<SiteRow> = sites
        .into_iter()
        .map(|site| {
            let key = site.key();
            SiteRow {
                loading: state.orchestrator.is_loading(&key),
                has_metrics: state.orchestrator.metrics_for(&key).is_some(),
                site,
            }
        })
        .collect();
    let total = rows.len();
    Json(SitesResponse { sites: rows, total })
}

#[derive(Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub sort: SortKey,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub sites: Vec<ScoredSite>,
    pub loading: Vec<SiteKey>,
    pub error: Option<String>,
    pub total: usize,
}

/// Scored, colour-coded metrics for every loaded site, best first.
/// Sites still loading or never loaded are simply absent from `sites`.
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsQuery>,
) -> Json<MetricsResponse> {
    let mut metrics = state.orchestrator.metrics_snapshot();
    sort_metrics(&mut metrics, params.sort);
    let sites = score_sites(metrics);
    let total = sites.len();

    Json(MetricsResponse {
        sites,
        loading: state.orchestrator.loading_sites(),
        error: state.orchestrator.error().await,
        total,
    })
}

/// Re-load metrics for every known site under the applied filters.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.orchestrator.clear_error().await;
    match state.orchestrator.refresh_data().await {
        Ok(()) => Ok(Json(SuccessResponse {
            message: "refresh complete".to_string(),
        })),
        Err(e) => Err(error_response(StatusCode::BAD_GATEWAY, e.to_string())),
    }
}

#[derive(Serialize)]
pub struct FiltersResponse {
    pub applied: FilterSnapshot,
    pub draft: FilterSnapshot,
}

pub async fn get_filters(State(state): State<Arc<AppState>>) -> Json<FiltersResponse> {
    Json(FiltersResponse {
        applied: state.filters.applied().await,
        draft: state.filters.draft().await,
    })
}

#[derive(Deserialize)]
pub struct DraftFilterRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub country: Option<String>,
}

/// Update the draft filters. Nothing is fetched until apply.
pub async fn update_draft(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DraftFilterRequest>,
) -> Result<Json<FiltersResponse>, ApiError> {
    let range = DateRange::new(payload.start_date, payload.end_date)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    state.filters.set_draft_range(range).await;
    state.filters.set_draft_country(payload.country).await;

    Ok(Json(FiltersResponse {
        applied: state.filters.applied().await,
        draft: state.filters.draft().await,
    }))
}

/// Apply the draft filters and refresh. On a whole-scope failure the
/// applied filters roll back and the draft is preserved for a retry.
pub async fn apply_filters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FiltersResponse>, ApiError> {
    state.orchestrator.clear_error().await;
    state
        .filters
        .apply()
        .await
        .map_err(|e| error_response(StatusCode::BAD_GATEWAY, e.to_string()))?;

    Ok(Json(FiltersResponse {
        applied: state.filters.applied().await,
        draft: state.filters.draft().await,
    }))
}

/// Reset both draft and applied filters to the default range and refresh.
pub async fn reset_filters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FiltersResponse>, ApiError> {
    state.orchestrator.clear_error().await;
    state
        .filters
        .reset()
        .await
        .map_err(|e| error_response(StatusCode::BAD_GATEWAY, e.to_string()))?;

    Ok(Json(FiltersResponse {
        applied: state.filters.applied().await,
        draft: state.filters.draft().await,
    }))
}

#[derive(Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<String>,
}

pub async fn list_accounts(State(state): State<Arc<AppState>>) -> Json<AccountsResponse> {
    Json(AccountsResponse {
        accounts: state.orchestrator.accounts().await,
    })
}

/// Connect an account and pull its sites (plus metrics) immediately.
pub async fn add_account(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Account>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    if payload.email.is_empty() || payload.token.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "email and token are required",
        ));
    }

    state
        .orchestrator
        .add_account(&payload)
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let sites = state.orchestrator.load_sites().await;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: format!("connected {} ({} sites known)", payload.email, sites.len()),
        }),
    ))
}

pub async fn remove_account(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if state.orchestrator.remove_account(&email).await {
        Ok(Json(SuccessResponse {
            message: format!("disconnected {email}"),
        }))
    } else {
        Err(error_response(
            StatusCode::NOT_FOUND,
            format!("no connected account {email}"),
        ))
    }
}
