// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

//! Sync orchestration: stream listings out of the relational store, project
//! them into search documents and bulk-submit them to the index.
//!
//! The pipeline is keyset-paginated, so memory use is bounded by the batch
//! size rather than the catalog size. Batch submissions run with bounded
//! concurrency and are independent: every document fully overwrites by id,
//! so re-submitting or reordering batches converges to the same index state.
//! A failed batch is retried with backoff; on exhaustion it is recorded in
//! the report and the run continues, ending `Degraded` instead of aborting
//! the whole catalog.

use crate::error::SearchError;
use crate::models::listing::ListingWithJoins;
use crate::models::search::{IndexConfiguration, SearchDocument};
use crate::services::db::ListingStore;
use crate::services::projector::project;
use crate::services::retry::{retry, RetryPolicy};
use crate::services::search::SearchIndex;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

/// Source of listing rows for a sync run. Implemented by [`ListingStore`];
/// tests substitute an in-memory fake.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Next id-ordered page of listings strictly after `after_id`
    async fn fetch_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ListingWithJoins>, SearchError>;

    /// Same page shape restricted to listings updated after the watermark
    async fn fetch_updated_page(
        &self,
        since: DateTime<Utc>,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ListingWithJoins>, SearchError>;
}

#[async_trait]
impl ListingSource for ListingStore {
    async fn fetch_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ListingWithJoins>, SearchError> {
        ListingStore::fetch_page(self, after_id, limit).await
    }

    async fn fetch_updated_page(
        &self,
        since: DateTime<Utc>,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ListingWithJoins>, SearchError> {
        ListingStore::fetch_updated_page(self, since, after_id, limit).await
    }
}

/// Write side of a sync run: configuration apply and bulk upsert.
/// Implemented by [`SearchIndex`]; tests substitute an in-memory fake.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn apply_configuration(&self, config: &IndexConfiguration) -> Result<(), SearchError>;

    async fn submit_batch(&self, documents: &[SearchDocument]) -> Result<(), SearchError>;
}

#[async_trait]
impl DocumentSink for SearchIndex {
    async fn apply_configuration(&self, config: &IndexConfiguration) -> Result<(), SearchError> {
        SearchIndex::apply_configuration(self, config).await
    }

    async fn submit_batch(&self, documents: &[SearchDocument]) -> Result<(), SearchError> {
        SearchIndex::submit_batch(self, documents).await
    }
}

/// Observable phase of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    ConfiguringIndex,
    Fetching,
    Projecting,
    Submitting,
    Completed,
    Degraded,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::ConfiguringIndex => "configuring_index",
            SyncPhase::Fetching => "fetching",
            SyncPhase::Projecting => "projecting",
            SyncPhase::Submitting => "submitting",
            SyncPhase::Completed => "completed",
            SyncPhase::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

/// Terminal status of a sync run. `Degraded` is terminal-but-successful:
/// queries keep being served against a partially stale index and operators
/// rerun sync to converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Completed,
    Degraded,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Completed => f.write_str("completed"),
            SyncStatus::Degraded => f.write_str("degraded"),
        }
    }
}

/// A batch that still failed after exhausting its retries
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// 0-based batch index within the run
    pub batch: usize,
    /// Number of documents that were in the batch
    pub documents: usize,
    pub error: String,
}

/// Outcome of one full or incremental sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub documents_indexed: usize,
    pub batches_submitted: usize,
    pub failures: Vec<BatchFailure>,
    pub duration: Duration,
    pub cancelled: bool,
    pub status: SyncStatus,
}

impl SyncReport {
    /// One-line human-readable summary for the operational entry point
    pub fn summary(&self) -> String {
        format!(
            "sync {}: {} documents indexed in {} batches, {} failed, took {:.1}s{}",
            self.status,
            self.documents_indexed,
            self.batches_submitted,
            self.failures.len(),
            self.duration.as_secs_f64(),
            if self.cancelled { " (cancelled)" } else { "" },
        )
    }
}

/// Tuning knobs for a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum documents per bulk-ingest request
    pub batch_size: usize,
    /// Batch submissions allowed in flight at once
    pub max_in_flight: usize,
    pub configuration_retry: RetryPolicy,
    pub batch_retry: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            max_in_flight: crate::config::DEFAULT_MAX_IN_FLIGHT,
            configuration_retry: RetryPolicy::configuration(),
            batch_retry: RetryPolicy::batch(),
        }
    }
}

enum FetchMode {
    Full,
    Since(DateTime<Utc>),
}

/// Drives full and incremental synchronization of the listings index.
///
/// Holds its collaborators by reference-counted handle (constructed once at
/// process start, released at shutdown). A run is a single logical
/// operation; a second invocation while one is in flight is rejected with
/// [`SearchError::SyncInProgress`].
pub struct SyncOrchestrator {
    source: Arc<dyn ListingSource>,
    sink: Arc<dyn DocumentSink>,
    config: IndexConfiguration,
    options: SyncOptions,
    run_guard: Mutex<()>,
    phase_tx: watch::Sender<SyncPhase>,
}

impl SyncOrchestrator {
    pub fn new(
        source: Arc<dyn ListingSource>,
        sink: Arc<dyn DocumentSink>,
        options: SyncOptions,
    ) -> Self {
        let (phase_tx, _) = watch::channel(SyncPhase::Idle);
        Self {
            source,
            sink,
            config: IndexConfiguration::default(),
            options,
            run_guard: Mutex::new(()),
            phase_tx,
        }
    }

    /// Subscribe to phase transitions of the current/next run
    pub fn phases(&self) -> watch::Receiver<SyncPhase> {
        self.phase_tx.subscribe()
    }

    /// Rebuild the entire index from the relational store.
    pub async fn full_sync(
        &self,
        cancel: watch::Receiver<bool>,
    ) -> Result<SyncReport, SearchError> {
        self.run(FetchMode::Full, cancel).await
    }

    /// Incremental variant: re-project and re-submit only listings updated
    /// after the watermark.
    pub async fn sync_since(
        &self,
        watermark: DateTime<Utc>,
        cancel: watch::Receiver<bool>,
    ) -> Result<SyncReport, SearchError> {
        self.run(FetchMode::Since(watermark), cancel).await
    }

    async fn run(
        &self,
        mode: FetchMode,
        cancel: watch::Receiver<bool>,
    ) -> Result<SyncReport, SearchError> {
        // Single-flight: reject rather than coalesce
        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| SearchError::SyncInProgress)?;

        let started = Instant::now();

        // Schema must precede data: filters and sort only work once the
        // configuration is applied, so failure here is fatal to the run.
        self.set_phase(SyncPhase::ConfiguringIndex);
        retry(
            "apply_configuration",
            &self.options.configuration_retry,
            || self.sink.apply_configuration(&self.config),
        )
        .await
        .inspect_err(|e| error!(error = %e, "index configuration failed, aborting sync"))?;

        let outcome = self.pump_batches(&mode, cancel).await?;
        let report = self.finish(outcome, started);

        info!(
            status = %report.status,
            documents = report.documents_indexed,
            batches = report.batches_submitted,
            failed = report.failures.len(),
            "sync run finished"
        );

        Ok(report)
    }

    /// Fetch-project-submit loop. Returns the accumulated counters; a data
    /// source failure aborts the run (nothing downstream can proceed).
    async fn pump_batches(
        &self,
        mode: &FetchMode,
        cancel: watch::Receiver<bool>,
    ) -> Result<RunCounters, SearchError> {
        let mut counters = RunCounters::default();
        let mut after_id: Option<String> = None;
        let mut batch_index = 0usize;
        let mut in_flight: FuturesUnordered<_> = FuturesUnordered::new();

        loop {
            // Cancellation is honored between batches only; a batch either
            // completes or is abandoned by the retry policy.
            if *cancel.borrow() {
                warn!("cancellation requested, draining in-flight batches");
                counters.cancelled = true;
                break;
            }

            self.set_phase(SyncPhase::Fetching);
            let rows = self.fetch_next(mode, after_id.as_deref()).await?;
            if rows.is_empty() {
                break;
            }
            after_id = rows.last().map(|row| row.listing.id.clone());

            self.set_phase(SyncPhase::Projecting);
            let documents: Vec<SearchDocument> = rows.iter().map(project).collect();

            self.set_phase(SyncPhase::Submitting);
            in_flight.push(self.submit_one(batch_index, documents));
            batch_index += 1;

            // Bound network parallelism: wait for a slot before fetching more
            while in_flight.len() >= self.options.max_in_flight {
                if let Some(outcome) = in_flight.next().await {
                    counters.absorb(outcome);
                }
            }
        }

        while let Some(outcome) = in_flight.next().await {
            counters.absorb(outcome);
        }

        Ok(counters)
    }

    async fn fetch_next(
        &self,
        mode: &FetchMode,
        after_id: Option<&str>,
    ) -> Result<Vec<ListingWithJoins>, SearchError> {
        let limit = self.options.batch_size;
        let watermark = match mode {
            FetchMode::Full => None,
            FetchMode::Since(ts) => Some(*ts),
        };
        let source = self.source.clone();
        let after: Option<String> = after_id.map(str::to_string);

        retry("fetch_listings", &self.options.batch_retry, move || {
            let source = source.clone();
            let after = after.clone();
            async move {
                match watermark {
                    None => source.fetch_page(after.as_deref(), limit).await,
                    Some(ts) => source.fetch_updated_page(ts, after.as_deref(), limit).await,
                }
            }
        })
        .await
        .inspect_err(|e| error!(error = %e, "listing fetch failed, aborting sync"))
    }

    /// Submit one batch with retry. Exhaustion is absorbed into the report,
    /// never propagated: a full-sync run is not all-or-nothing.
    fn submit_one(
        &self,
        batch: usize,
        documents: Vec<SearchDocument>,
    ) -> impl std::future::Future<Output = BatchOutcome> + '_ {
        let sink = self.sink.clone();
        let policy = self.options.batch_retry.clone();
        async move {
            let size = documents.len();
            let result = retry("submit_batch", &policy, || sink.submit_batch(&documents)).await;

            match result {
                Ok(()) => {
                    info!(batch, documents = size, "batch submitted");
                    BatchOutcome::Submitted { documents: size }
                }
                Err(err) => {
                    warn!(batch, documents = size, error = %err, "batch failed after retries");
                    BatchOutcome::Failed(BatchFailure {
                        batch,
                        documents: size,
                        error: err.to_string(),
                    })
                }
            }
        }
    }

    fn finish(&self, counters: RunCounters, started: Instant) -> SyncReport {
        let status = if counters.failures.is_empty() && !counters.cancelled {
            SyncStatus::Completed
        } else {
            SyncStatus::Degraded
        };

        self.set_phase(match status {
            SyncStatus::Completed => SyncPhase::Completed,
            SyncStatus::Degraded => SyncPhase::Degraded,
        });

        SyncReport {
            documents_indexed: counters.documents_indexed,
            batches_submitted: counters.batches_submitted,
            failures: counters.failures,
            duration: started.elapsed(),
            cancelled: counters.cancelled,
            status,
        }
    }

    fn set_phase(&self, phase: SyncPhase) {
        // Receivers are optional; send only fails when none exist
        let _ = self.phase_tx.send(phase);
    }
}

enum BatchOutcome {
    Submitted { documents: usize },
    Failed(BatchFailure),
}

#[derive(Default)]
struct RunCounters {
    documents_indexed: usize,
    batches_submitted: usize,
    failures: Vec<BatchFailure>,
    cancelled: bool,
}

impl RunCounters {
    fn absorb(&mut self, outcome: BatchOutcome) {
        self.batches_submitted += 1;
        match outcome {
            BatchOutcome::Submitted { documents } => self.documents_indexed += documents,
            BatchOutcome::Failed(failure) => self.failures.push(failure),
        }
    }
}
