use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use searchdeck::api::{create_api_router, AppState};
use searchdeck::config::Config;
use searchdeck::dashboard::{FilterController, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let initial = FilterController::default_snapshot(config.default_range_days);
    let orchestrator = Arc::new(Orchestrator::new(
        &config.gsc.api_base,
        Duration::from_secs(config.gsc.request_timeout_secs),
        initial.clone(),
    ));

    // Connect configured accounts
    for account in &config.accounts {
        orchestrator.add_account(account).await?;
    }

    if config.accounts.is_empty() {
        warn!("No accounts configured - connect one via POST /api/accounts");
    } else {
        info!(
            "Loading sites for {} configured account(s)...",
            config.accounts.len()
        );
        let sites = orchestrator.load_sites().await;
        info!("Loaded metrics for {} site(s)", sites.len());
        if let Some(error) = orchestrator.error().await {
            warn!("Initial load reported an error: {error}");
        }
    }

    let filters = Arc::new(FilterController::new(
        Arc::clone(&orchestrator),
        config.default_range_days,
        initial,
    ));

    let state = Arc::new(AppState {
        orchestrator,
        filters,
    });
    let router = create_api_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Dashboard API listening on http://{}", addr);
    info!("   - Endpoints available at http://{}/api/...", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
