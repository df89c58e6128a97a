use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use searchdeck::analytics::{score_sites, sort_metrics, SortKey};
use searchdeck::config::Config;
use searchdeck::dashboard::Orchestrator;
use searchdeck::models::{DateRange, FilterSnapshot, TrendDirection};

#[derive(Parser)]
#[command(name = "searchdeck-report")]
#[command(about = "Searchdeck headless reporting CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the verified sites of every configured account
    Sites,
    /// Print a ranked performance report across all sites
    Report {
        /// Sort key for the ranking
        #[arg(long, value_enum, default_value = "clicks")]
        sort: SortKey,
        /// Restrict to one country (lowercase ISO3-style code)
        #[arg(long)]
        country: Option<String>,
        /// Number of trailing days to report on
        #[arg(long, default_value_t = 28)]
        days: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    if config.accounts.is_empty() {
        bail!("no accounts configured; set SEARCHDECK_ACCOUNTS or SEARCHDECK_ACCOUNTS_FILE");
    }

    let snapshot = match &cli.command {
        Commands::Sites => FilterSnapshot::new(DateRange::last_days(config.default_range_days), None),
        Commands::Report { country, days, .. } => FilterSnapshot::new(
            DateRange::last_days(*days),
            country.as_ref().map(|c| c.to_lowercase()),
        ),
    };

    let orchestrator = Arc::new(Orchestrator::new(
        &config.gsc.api_base,
        Duration::from_secs(config.gsc.request_timeout_secs),
        snapshot,
    ));
    for account in &config.accounts {
        orchestrator.add_account(account).await?;
    }

    let sites = orchestrator.load_sites().await;
    if let Some(error) = orchestrator.error().await {
        bail!("{error}");
    }

    match cli.command {
        Commands::Sites => {
            if sites.is_empty() {
                println!("No verified sites found.");
            } else {
                println!("{:<50} {:<20} {}", "Site", "Permission", "Account");
                println!("{}", "-".repeat(100));
                for site in sites {
                    println!(
                        "{:<50} {:<20} {}",
                        site.site_url, site.permission_level, site.account_email
                    );
                }
            }
        }
        Commands::Report { sort, .. } => {
            let mut metrics = orchestrator.metrics_snapshot();
            sort_metrics(&mut metrics, sort);
            let scored = score_sites(metrics);

            if scored.is_empty() {
                println!("No metrics loaded.");
            } else {
                println!(
                    "{:<50} {:>8} {:>12} {:>7} {:>9} {:>8} {:>6}",
                    "Site", "Clicks", "Impressions", "CTR", "Position", "Trend", "Score"
                );
                println!("{}", "-".repeat(105));
                for entry in scored {
                    let arrow = match entry.metrics.trend.direction {
                        TrendDirection::Up => "↑",
                        TrendDirection::Down => "↓",
                        TrendDirection::Stable => "→",
                    };
                    let score = entry
                        .score
                        .map(|s| format!("{s:.2}"))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<50} {:>8} {:>12} {:>6.1}% {:>9.1} {:>5}{:>2.1}% {:>6}",
                        entry.metrics.site_url,
                        entry.metrics.total_clicks,
                        entry.metrics.total_impressions,
                        entry.metrics.average_ctr * 100.0,
                        entry.metrics.average_position,
                        arrow,
                        entry.metrics.trend.change_percent,
                        score,
                    );
                }
            }
        }
    }

    Ok(())
}
