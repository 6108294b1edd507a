//! Background miner — periodically seals pending transactions.
//!
//! The loop waits `interval` between attempts and listens on a `watch`
//! channel for shutdown, so the task never outlives its owner. The wait only
//! happens *between* mining attempts: shutdown cannot interrupt an
//! in-progress proof-of-work search, only prevent the next one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use auditchain_core::ChainStore;

/// Handle to the background mining task.
pub struct MinerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MinerHandle {
    /// Spawn the mining loop against `chain`, sealing every `interval`.
    pub fn spawn(chain: Arc<ChainStore>, interval: Duration) -> Self {
        let (shutdown, mut signal) = watch::channel(false);
        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "mining loop started");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        match chain.mine_pending().await {
                            Ok(Some(block)) => info!(
                                index = block.index,
                                transactions = block.transactions().len(),
                                "background miner sealed block"
                            ),
                            Ok(None) => debug!("nothing to mine"),
                            Err(e) => error!(error = %e, "background mining attempt failed"),
                        }
                    }
                    _ = signal.changed() => break,
                }
            }
            debug!("mining loop exited");
        });
        Self { shutdown, task }
    }

    /// Returns `true` while the mining task is alive.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal shutdown and wait up to `wait` for the task to exit.
    pub async fn stop(self, wait: Duration) {
        let _ = self.shutdown.send(true);
        match tokio::time::timeout(wait, self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "mining task join failed"),
            Err(_) => warn!(wait_secs = wait.as_secs(), "mining task did not stop in time"),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
