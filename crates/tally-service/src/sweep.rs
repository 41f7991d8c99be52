//! # Status Sweep
//!
//! Periodic best-effort recheck that re-derives every product's status
//! from `(quantity, threshold)` and rewrites rows that have drifted.
//!
//! ## Why It Exists
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Status Sweep                                     │
//! │                                                                         │
//! │  Every mutation site recomputes status in its own transaction, so in  │
//! │  normal operation the sweep finds nothing to do. It exists because    │
//! │  status is persisted alongside its source fields: any out-of-band     │
//! │  write (manual fix-up, restored backup, future migration) could leave │
//! │  it stale. The sweep re-derives with the SAME function the mutation   │
//! │  sites use and logs loudly when it had to correct anything.           │
//! │                                                                         │
//! │  Idempotent, read-mostly, safe to run concurrently with any           │
//! │  operation: it only ever writes the derived field from the            │
//! │  canonical ones.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use tally_db::Database;

// =============================================================================
// Status Sweep
// =============================================================================

/// Periodic stock-status recheck task.
pub struct StatusSweep;

/// Handle for stopping a running sweep.
pub struct StatusSweepHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl StatusSweep {
    /// Spawns the sweep loop. The first pass runs immediately, then every
    /// `interval`.
    pub fn spawn(db: Database, interval: Duration) -> StatusSweepHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs_f64(), "Status sweep started");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::run_once(&db).await;
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Status sweep stopping");
                        break;
                    }
                }
            }
        });

        StatusSweepHandle { shutdown_tx, task }
    }

    /// One sweep pass. Errors are logged, never propagated - the sweep is
    /// best-effort and the next tick retries.
    pub async fn run_once(db: &Database) {
        match db.products().resync_statuses().await {
            Ok(0) => debug!("Status sweep: no drift"),
            Ok(corrected) => {
                warn!(corrected = corrected, "Status sweep corrected drifted rows")
            }
            Err(err) => error!(error = %err, "Status sweep pass failed"),
        }
    }
}

impl StatusSweepHandle {
    /// Triggers graceful shutdown and waits for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{service, spec, TENANT};
    use tally_core::StockStatus;

    #[tokio::test]
    async fn test_run_once_corrects_drift() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 10, 2)).await.unwrap();

        // Drift the stored status out-of-band
        sqlx::query("UPDATE products SET status = 'Out of Stock'")
            .execute(svc.database().pool())
            .await
            .unwrap();

        StatusSweep::run_once(svc.database()).await;

        let product = svc.current_stock(TENANT, "A-1").await.unwrap();
        assert_eq!(product.status, StockStatus::InStock);
    }

    #[tokio::test]
    async fn test_spawned_sweep_runs_and_shuts_down() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 10, 2)).await.unwrap();

        sqlx::query("UPDATE products SET status = 'Low Stock'")
            .execute(svc.database().pool())
            .await
            .unwrap();

        let handle = StatusSweep::spawn(svc.database().clone(), Duration::from_millis(10));

        // First tick fires immediately; give it a moment to land
        tokio::time::sleep(Duration::from_millis(100)).await;

        let product = svc.current_stock(TENANT, "A-1").await.unwrap();
        assert_eq!(product.status, StockStatus::InStock);

        handle.shutdown().await;
    }
}
