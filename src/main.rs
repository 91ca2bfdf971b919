// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use gigs_search::app::{create_router, AppState, VERSION};
use gigs_search::config::Config;
use gigs_search::services::db::ListingStore;
use gigs_search::services::search::SearchIndex;
use gigs_search::services::sync::{SyncOptions, SyncOrchestrator, SyncStatus};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code for a sync run that finished with unrecoverable batch failures
const EXIT_DEGRADED: i32 = 2;

#[derive(Parser)]
#[command(name = "gigs-search", version = VERSION, about = "Gigs.ma search index sync & query service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the search query API
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Run one sync of the listings index to completion and exit
    Sync {
        /// Only re-index listings updated after this RFC 3339 timestamp
        /// (incremental sync); omit for a full rebuild
        #[arg(long)]
        since: Option<String>,
        /// Override the configured batch size
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve { port } => serve(config, port).await,
        Command::Sync { since, batch_size } => run_sync(config, since, batch_size).await,
    }
}

fn build_search_index(config: &Config) -> anyhow::Result<Arc<SearchIndex>> {
    let index = SearchIndex::new(
        &config.meilisearch_url,
        config.meilisearch_api_key.clone(),
        config.index_name.clone(),
    )
    .context("failed to create Meilisearch client")?;
    Ok(Arc::new(index))
}

async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let search_index = match build_search_index(&config) {
        Ok(index) => Some(index),
        Err(e) => {
            warn!(error = %e, "continuing without search index");
            None
        }
    };

    let state = AppState { search_index };
    let app = create_router(state);

    // Bind to 0.0.0.0 to accept connections from any network interface
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("gigs-search v{} listening on {}", VERSION, addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn run_sync(
    config: Config,
    since: Option<String>,
    batch_size: Option<usize>,
) -> anyhow::Result<()> {
    let watermark: Option<DateTime<Utc>> = since
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|ts| ts.with_timezone(&Utc))
                .with_context(|| format!("--since must be an RFC 3339 timestamp, got '{raw}'"))
        })
        .transpose()?;

    let store = ListingStore::connect(&config.database_url)
        .await
        .context("failed to connect to listings database")?;
    let index = build_search_index(&config)?;

    let options = SyncOptions {
        batch_size: batch_size.unwrap_or(config.batch_size),
        max_in_flight: config.max_in_flight,
        ..Default::default()
    };
    let orchestrator = SyncOrchestrator::new(Arc::new(store), index, options);

    // Ctrl-C requests cancellation; the run stops between batches
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling sync between batches");
            let _ = cancel_tx.send(true);
        }
    });

    let report = match watermark {
        Some(ts) => orchestrator.sync_since(ts, cancel_rx).await?,
        None => orchestrator.full_sync(cancel_rx).await?,
    };

    println!("{}", report.summary());
    for failure in &report.failures {
        eprintln!(
            "batch {} failed ({} documents): {}",
            failure.batch, failure.documents, failure.error
        );
    }

    if report.status == SyncStatus::Degraded {
        std::process::exit(EXIT_DEGRADED);
    }
    Ok(())
}
