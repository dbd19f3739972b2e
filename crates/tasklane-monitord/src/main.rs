mod config;
mod refresh_loop;

use std::{fs::File, io::BufReader, path::Path, sync::Arc};

use anyhow::Context;
use tasklane_api::{HttpApi, StreamStateAdapter, axum};
use tasklane_core::{MemoryStore, Refresher, StreamState};
use tasklane_model::HistorySeed;
use tasklane_observe::logger_init;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{config::MonitorConfig, refresh_loop::run_refresh_loop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Config + logger
    let cfg = MonitorConfig::from_env()?;
    logger_init(&cfg.logger)?;
    info!(format = %cfg.logger.format, level = %cfg.logger.level, "logger initialized");

    // 2) Store
    let store = Arc::new(load_store(cfg.history_file.as_deref())?);

    // 3) Refresh loop
    let state = StreamState::new();
    let cancel = CancellationToken::new();
    let refresh = tokio::spawn(run_refresh_loop(
        store,
        Refresher::new(cfg.refresh.clone()),
        state.clone(),
        cfg.refresh_interval,
        cancel.clone(),
    ));

    // 4) HTTP feed
    let app = HttpApi::new(Arc::new(StreamStateAdapter::new(state))).router();
    let listener = tokio::net::TcpListener::bind(cfg.listen)
        .await
        .with_context(|| format!("bind {}", cfg.listen))?;
    info!(addr = %cfg.listen, "task stream feed listening");
    info!("press Ctrl+C to stop");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(reason = %e, "failed to listen for Ctrl+C");
            }
            info!("shutting down...");
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    refresh.await?;
    Ok(())
}

fn load_store(path: Option<&Path>) -> anyhow::Result<MemoryStore> {
    let Some(path) = path else {
        warn!("no history file configured; serving an empty store");
        return Ok(MemoryStore::new());
    };

    let file = File::open(path).with_context(|| format!("open history file {}", path.display()))?;
    let seed: HistorySeed = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse history file {}", path.display()))?;
    info!(
        path = %path.display(),
        finished = seed.finished.len(),
        failed = seed.failed.len(),
        running = seed.running.len(),
        "history loaded"
    );

    Ok(MemoryStore::from_seed(seed))
}
