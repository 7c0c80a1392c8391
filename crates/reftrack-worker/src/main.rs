use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use reftrack_core::fraud::AlwaysClean;
use reftrack_core::fraud::IpReputation;
use reftrack_core::sheets::SheetSink;
use reftrack_worker::reputation::HttpReputationClient;
use reftrack_worker::scheduler;
use reftrack_worker::sheets::{parse_service_account_json, GoogleSheetsSink, MemorySheet};
use reftrack_worker::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logging; level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reftrack=info".parse()?),
        )
        .json()
        .init();

    let cfg = reftrack_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/reftrack.db", cfg.data_dir);
    let db = Arc::new(reftrack_duckdb::DuckDbBackend::open(
        &db_path,
        &cfg.duckdb_memory_limit,
    )?);

    // Misconfigured credentials fail fast here; a missing payload drops to
    // the in-memory dry-run sink so local runs work without secrets.
    let sink: Arc<dyn SheetSink> = match &cfg.service_account_json {
        Some(raw) => {
            let key = parse_service_account_json(raw)?;
            info!(sheet_id = %cfg.sheet_id, "Google Sheets sink configured");
            Arc::new(GoogleSheetsSink::new(key, cfg.sheet_id.clone())?)
        }
        None => {
            warn!(
                "REFTRACK_SERVICE_ACCOUNT_JSON not set — exports go to an \
                 in-memory sink and are discarded"
            );
            Arc::new(MemorySheet::new())
        }
    };

    let reputation: Arc<dyn IpReputation> = match HttpReputationClient::from_config(&cfg) {
        Some(client) => Arc::new(client),
        None => {
            info!("no reputation endpoint configured; proxy signal disabled");
            Arc::new(AlwaysClean)
        }
    };

    let state = Arc::new(AppState::new(db, cfg, sink, reputation));

    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            scheduler::run_raw_export_loop(state).await;
        });
    }
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            scheduler::run_daily_pipeline_loop(state).await;
        });
    }

    info!("reftrack worker running");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    Ok(())
}
