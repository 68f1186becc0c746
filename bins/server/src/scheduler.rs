//! Periodic revenue cycle orchestrator task.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use sairex_api::RevenueOrchestrator;
use sairex_shared::OrchestratorConfig;

/// Spawns the scheduled run, or returns `None` when disabled.
///
/// Ticks missed while a run is still in progress are skipped. Concurrent
/// instances are kept apart by the advisory lock inside each run.
pub fn spawn(
    orchestrator: Arc<RevenueOrchestrator>,
    config: &OrchestratorConfig,
) -> Option<JoinHandle<()>> {
    if !config.enabled {
        info!("revenue cycle orchestrator disabled");
        return None;
    }

    let period = Duration::from_secs(config.interval_secs.max(1));
    let run_on_startup = config.run_on_startup;
    info!(
        interval_secs = period.as_secs(),
        run_on_startup, "revenue cycle orchestrator scheduled"
    );

    Some(tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick completes immediately.
        if !run_on_startup {
            ticker.tick().await;
        }

        loop {
            ticker.tick().await;
            match orchestrator.run(Utc::now()).await {
                Ok(summary) if summary.lock_acquired => info!(
                    processed = summary.processed,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    "scheduled orchestrator run finished"
                ),
                Ok(_) => {}
                Err(e) => error!(error = %e, code = e.error_code(), "scheduled orchestrator run failed"),
            }
        }
    }))
}
