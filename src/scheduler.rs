//! # Batch Scheduler
//!
//! Drives the periodic batch passes: commits, then deployments (with
//! attribution), then incidents, strictly in sequence. Passes never
//! overlap (the engine relies on non-concurrent invocation for the
//! `lead_time_processed` flag and the watermarks), and a failed pass is
//! simply retried wholesale on the next tick.

use std::sync::Arc;

use metrics::{counter, histogram};
use sea_orm::DatabaseConnection;
use tokio::time::{Duration as TokioDuration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::engine::attribution::LeadTimeAttributor;
use crate::error::EngineError;
use crate::sync::{CommitSource, CommitSync, DeploymentSource, DeploymentSync, IncidentSource, IncidentSync};

/// The collaborator sources wired into this process. Any of them may be
/// absent; ingestion for that kind is then expected to happen out of
/// process, and the scheduler still runs attribution over whatever has
/// been mirrored.
#[derive(Default, Clone)]
pub struct SourceSet {
    pub commits: Option<Arc<dyn CommitSource>>,
    pub deployments: Option<Arc<dyn DeploymentSource>>,
    pub incidents: Option<Arc<dyn IncidentSource>>,
}

/// Background scheduler running the sweep on a fixed tick.
pub struct BatchScheduler {
    config: Arc<AppConfig>,
    db: Arc<DatabaseConnection>,
    sources: SourceSet,
}

impl BatchScheduler {
    pub fn new(config: Arc<AppConfig>, db: Arc<DatabaseConnection>, sources: SourceSet) -> Self {
        Self {
            config,
            db,
            sources,
        }
    }

    /// Run the scheduler loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), EngineError> {
        info!(
            tick_seconds = self.config.tick_interval_seconds,
            environment = %self.config.target_environment,
            "Starting batch scheduler"
        );
        let tick_interval = TokioDuration::from_secs(self.config.tick_interval_seconds);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Batch scheduler shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.run_pass().await {
                        error!(error = ?err, "Batch pass failed; will retry next tick");
                        counter!("batch_pass_failures_total").increment(1);
                    }
                    let elapsed = tick_started.elapsed();
                    histogram!("batch_pass_duration_ms").record(elapsed.as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Batch scheduler stopped");
        Ok(())
    }

    /// One full sweep. Sub-passes run in order; each contains its own
    /// per-record failures, so an error reaching this level is a pass-wide
    /// one (e.g. the store is unreachable).
    pub async fn run_pass(&self) -> Result<(), EngineError> {
        let lookback = self.config.sync_lookback_days;

        if let Some(source) = &self.sources.commits {
            CommitSync::new(&self.db, source.as_ref(), lookback).run().await?;
        }

        if let Some(source) = &self.sources.deployments {
            // Attribution runs inside the deployment sweep.
            DeploymentSync::new(
                &self.db,
                source.as_ref(),
                lookback,
                &self.config.target_environment,
            )
            .run()
            .await?;
        } else {
            LeadTimeAttributor::new(&self.db, &self.config.target_environment)
                .run()
                .await?;
        }

        if let Some(source) = &self.sources.incidents {
            IncidentSync::new(&self.db, source.as_ref(), lookback).run().await?;
        }

        Ok(())
    }
}
