//! Runner module for the movies ETL.
//!
//! Polls every pipeline on a fixed interval until shutdown is requested.

use futures::future::join_all;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::errors::EtlError;
use crate::pipeline::{Pipeline, RunSummary};

/// Default pause between two passes over the pipelines.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for the runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Sleep between passes.
    pub poll_interval: Duration,
    /// Run the pipelines of one pass concurrently instead of one by one.
    pub parallel: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            parallel: false,
        }
    }
}

/// Outcome of one pass over all pipelines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Pipelines that finished without error.
    pub succeeded: usize,
    /// Pipelines that stopped on an error.
    pub failed: usize,
    /// Work done by the pipelines of this pass.
    pub summary: RunSummary,
}

/// Drives the pipelines until the shutdown token is cancelled.
///
/// A failing pipeline is logged and tried again on the next pass; it never
/// stops the runner. Cancellation is checked before every pass and
/// interrupts the sleep between passes. A pass that already started runs to
/// completion.
pub struct Runner {
    pipelines: Vec<Pipeline>,
    config: RunnerConfig,
    shutdown: CancellationToken,
}

impl Runner {
    pub fn new(pipelines: Vec<Pipeline>, config: RunnerConfig, shutdown: CancellationToken) -> Self {
        Self {
            pipelines,
            config,
            shutdown,
        }
    }

    /// Run until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) {
        info!(
            pipelines = self.pipelines.len(),
            poll_interval_secs = self.config.poll_interval.as_secs_f64(),
            parallel = self.config.parallel,
            "Starting ETL runner"
        );

        let mut totals = RunSummary::default();
        let mut passes: u64 = 0;
        let mut prev_time = Instant::now();

        while !self.shutdown.is_cancelled() {
            let report = self.tick().await;
            totals += report.summary;
            passes += 1;

            let now = Instant::now();
            let elapsed_secs = now.duration_since(prev_time).as_secs_f64();
            let documents_per_sec = if elapsed_secs > 0.0 {
                report.summary.documents as f64 / elapsed_secs
            } else {
                0.0
            };
            prev_time = now;

            info!(
                pass = passes,
                succeeded = report.succeeded,
                failed = report.failed,
                documents = report.summary.documents,
                documents_indexed = totals.documents,
                documents_per_sec = format!("{:.2}", documents_per_sec),
                "Processing progress"
            );

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = sleep(self.config.poll_interval) => {}
            }
        }

        info!(
            passes = passes,
            chunks_processed = totals.chunks,
            records_read = totals.records,
            documents_indexed = totals.documents,
            "Runner shutdown complete"
        );
    }

    /// Run every pipeline once.
    pub async fn tick(&self) -> TickReport {
        let outcomes: Vec<(&'static str, Result<RunSummary, EtlError>)> = if self.config.parallel {
            join_all(
                self.pipelines
                    .iter()
                    .map(|pipeline| async move { (pipeline.name(), pipeline.run().await) }),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(self.pipelines.len());
            for pipeline in &self.pipelines {
                if self.shutdown.is_cancelled() {
                    break;
                }
                outcomes.push((pipeline.name(), pipeline.run().await));
            }
            outcomes
        };

        let mut report = TickReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(summary) => {
                    report.succeeded += 1;
                    report.summary += summary;
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        pipeline = name,
                        error = %e,
                        transient = e.is_transient(),
                        "Pipeline run failed, retrying on next pass"
                    );
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert!(!config.parallel);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_no_pass() {
        let token = CancellationToken::new();
        token.cancel();
        let runner = Runner::new(Vec::new(), RunnerConfig::default(), token);

        let started = tokio::time::Instant::now();
        runner.run().await;

        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_tick_after_shutdown_skips_pipelines() {
        let token = CancellationToken::new();
        token.cancel();
        let runner = Runner::new(Vec::new(), RunnerConfig::default(), token);

        assert_eq!(runner.tick().await, TickReport::default());
    }
}
