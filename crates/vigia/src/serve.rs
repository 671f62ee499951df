// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vigia serve` command implementation.
//!
//! Starts the full pipeline service: SQLite storage, the analysis client,
//! the batch processor behind the HTTP gateway, plus the janitor and
//! scheduler loops. Supports graceful shutdown via ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vigia_config::model::VigiaConfig;
use vigia_core::{StorageAdapter, VigiaError};
use vigia_gateway::{AuthConfig, GatewayState, ServerConfig};
use vigia_intelligence::AnalysisClient;
use vigia_pipeline::{BatchProcessor, JanitorRunner, SummaryScheduler};
use vigia_storage::SqliteStorage;

/// Initialize the tracing subscriber from the configured log level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs the `vigia serve` command.
pub async fn run_serve(config: VigiaConfig) -> Result<(), VigiaError> {
    init_tracing(&config.service.log_level);

    info!(name = %config.service.name, "starting vigia serve");

    // Storage first: everything else hangs off it.
    let storage: Arc<dyn StorageAdapter> =
        Arc::new(SqliteStorage::open(&config.storage).await?);

    // Analysis client with all parameters fixed at construction.
    let intelligence = Arc::new(AnalysisClient::new(&config.intelligence)?);

    let processor = Arc::new(BatchProcessor::new(
        Arc::clone(&storage),
        intelligence,
        config.intelligence.model.clone(),
    ));

    let cancel = CancellationToken::new();
    let mut background = Vec::new();

    if config.janitor.enabled {
        let janitor = JanitorRunner::new(
            Arc::clone(&storage),
            Duration::from_secs(config.janitor.interval_secs),
            Duration::from_secs(config.janitor.stale_after_secs),
        );
        let token = cancel.clone();
        background.push(tokio::spawn(async move { janitor.run(token).await }));
        info!(
            stale_after_secs = config.janitor.stale_after_secs,
            "janitor started"
        );
    }

    if config.scheduler.enabled {
        let scheduler = SummaryScheduler::new(
            Arc::clone(&storage),
            Arc::clone(&processor),
            config.scheduler.clone(),
        );
        let token = cancel.clone();
        background.push(tokio::spawn(async move { scheduler.run(token).await }));
        info!(
            interval_secs = config.scheduler.interval_secs,
            "scheduler started"
        );
    }

    if config.gateway.bearer_token.is_none() {
        warn!("gateway.bearer_token is not set -- API requests will be rejected");
    }

    let state = GatewayState {
        processor,
        storage: Arc::clone(&storage),
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        start_time: std::time::Instant::now(),
    };
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };

    // Serve until the process is interrupted.
    let result = tokio::select! {
        result = vigia_gateway::start_server(&server_config, state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            Ok(())
        }
    };

    cancel.cancel();
    for task in background {
        let _ = task.await;
    }
    storage.close().await?;
    info!("vigia stopped");

    result
}
