//! Background refresh loop
//!
//! Sleeps for the configured interval, runs one refresh cycle, logs the
//! outcome and repeats until cancelled. A failed cycle never ends the loop.

use crate::refresh::RefreshEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub struct RefreshScheduler {
    engine: Arc<RefreshEngine>,
    interval: Duration,
    cancel: CancellationToken,
}

impl RefreshScheduler {
    pub fn new(engine: Arc<RefreshEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the loop once cancelled. A cycle already running completes first.
    pub fn stop_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start the loop on the tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.interval.as_secs_f64(),
                "Metrics refresh loop started"
            );
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    _ = self.cancel.cancelled() => break,
                }
                run_cycle(&self.engine).await;
            }
            debug!("Metrics refresh loop stopped");
        })
    }
}

/// Run one refresh cycle, logging instead of propagating failure.
pub async fn run_cycle(engine: &RefreshEngine) {
    if let Err(e) = engine.refresh().await {
        error!(error = %e, "Error in update loop");
    }
}

/// Cancel the loop and wait for it. Returns false if the task had died.
pub async fn shutdown(stop: CancellationToken, task: JoinHandle<()>) -> bool {
    stop.cancel();
    match task.await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Metrics refresh loop terminated abnormally");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ExporterMetrics;
    use crate::refresh::tests::ScriptedSource;
    use herowatch_shared::Roster;

    fn engine() -> (Arc<ExporterMetrics>, Arc<RefreshEngine>) {
        let metrics = Arc::new(ExporterMetrics::new().unwrap());
        let engine = Arc::new(RefreshEngine::new(
            Arc::new(ScriptedSource::default()),
            metrics.clone(),
            Roster::new(["Superman", "Batman"]).unwrap(),
        ));
        (metrics, engine)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_once_per_interval() {
        let (metrics, engine) = engine();
        let scheduler = RefreshScheduler::new(engine, Duration::from_secs(20));
        let stop = scheduler.stop_token();
        let handle = scheduler.spawn();

        // Nothing runs before the first interval elapses.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(metrics.api_calls.get(), 0.0);

        // Cycles at t=20s and t=40s.
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(metrics.api_calls.get(), 4.0);

        stop.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_cancelled() {
        let (metrics, engine) = engine();
        let scheduler = RefreshScheduler::new(engine, Duration::from_secs(20));
        let stop = scheduler.stop_token();
        let handle = scheduler.spawn();

        stop.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(metrics.api_calls.get(), 0.0);
    }

    #[tokio::test]
    async fn test_run_cycle_survives_failures() {
        let (metrics, engine) = engine();
        run_cycle(&engine).await;
        run_cycle(&engine).await;
        assert_eq!(metrics.api_errors.get(), 4.0);
        assert_eq!(metrics.hero_pages.get(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_running_loop() {
        let (_metrics, engine) = engine();
        let scheduler = RefreshScheduler::new(engine, Duration::from_secs(20));
        let stop = scheduler.stop_token();
        let handle = scheduler.spawn();

        assert!(shutdown(stop, handle).await);
    }

    #[tokio::test]
    async fn test_shutdown_reports_panicked_loop() {
        let handle = tokio::spawn(async {
            panic!("refresh loop exploded");
        });
        assert!(!shutdown(CancellationToken::new(), handle).await);
    }
}
