//! Timer-driven scan cycles.

use std::sync::Arc;
use std::time::Duration;

use crate::engine::UserFilter;
use crate::LiveEngine;

/// Spawns the recurring full-collection scan.
///
/// The interval is measured from the end of one cycle to the start of the
/// next, not wall-clock aligned: slow upstream fetches stretch the period
/// instead of stacking cycles. Cycle failures are logged and never end the
/// loop. The engine's internal lock keeps these cycles serialized with
/// manual `/check` requests.
pub fn spawn_price_monitor(engine: Arc<LiveEngine>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            match engine.run_cycle(&UserFilter::All).await {
                Ok(outcome) => {
                    tracing::info!(
                        scanned = outcome.scanned,
                        notifications = outcome.notifications.len(),
                        fetch_failures = outcome.fetch_failures,
                        "scheduled scan cycle complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduled scan cycle failed");
                }
            }

            tokio::time::sleep(interval).await;
        }
    });
}
