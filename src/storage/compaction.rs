//! Background space-reclamation scheduler.
//!
//! One task, two tickers: a conditional ticker that reclaims only when
//! the value log grew since the last pass, and a mandatory ticker that
//! always reclaims. The task is owned by the store facade and stops
//! cooperatively when its cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::engine::Engine;
use crate::engine::SpaceReclaimed;
use crate::StoreOptions;

/// A value-log region is rewritten once its live-data ratio drops below
/// this fraction.
const DISCARD_RATIO: f64 = 0.7;

#[derive(Debug, Clone)]
pub(crate) struct CompactionConfig {
    pub(crate) interval: Duration,
    pub(crate) mandatory_interval: Duration,
    pub(crate) growth_threshold: u64,
}

impl From<&StoreOptions> for CompactionConfig {
    fn from(options: &StoreOptions) -> Self {
        Self {
            interval: options.compaction_interval(),
            mandatory_interval: options.mandatory_compaction_interval(),
            growth_threshold: options.compaction_growth_threshold,
        }
    }
}

/// Handle owned by the facade; cancelling it stops both tickers.
pub(crate) struct CompactionHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl CompactionHandle {
    /// Signals the task to stop without waiting for it.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stops both tickers and waits until the task has exited, so the
    /// engine handle is never touched after close.
    pub(crate) async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            error!(?e, "compaction task did not shut down cleanly");
        }
    }
}

/// Spawns the scheduler task. Requires a tokio runtime.
pub(crate) fn start<E: Engine>(
    engine: Arc<E>,
    config: CompactionConfig,
) -> CompactionHandle {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let join = tokio::spawn(run(engine, config, task_cancel));
    debug!("compaction scheduler started");
    CompactionHandle { cancel, join }
}

async fn run<E: Engine>(
    engine: Arc<E>,
    config: CompactionConfig,
    cancel: CancellationToken,
) {
    // Baseline for the growth check; local to this task and updated only
    // after a reclamation pass.
    let mut last_size = engine.on_disk_size().unwrap_or(0);

    let now = Instant::now();
    let mut conditional = tokio::time::interval_at(now + config.interval, config.interval);
    let mut mandatory =
        tokio::time::interval_at(now + config.mandatory_interval, config.mandatory_interval);
    conditional.set_missed_tick_behavior(MissedTickBehavior::Skip);
    mandatory.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = conditional.tick() => {
                let current = match engine.on_disk_size() {
                    Ok(size) => size,
                    Err(e) => {
                        warn!(error = %e, "failed to read on-disk size; skipping tick");
                        continue;
                    }
                };
                if current < last_size.saturating_add(config.growth_threshold) {
                    continue;
                }
                last_size = reclaim_until_exhausted(engine.as_ref(), last_size);
            }
            _ = mandatory.tick() => {
                last_size = reclaim_until_exhausted(engine.as_ref(), last_size);
            }
        }
    }

    debug!("compaction scheduler stopped");
}

/// Runs reclamation passes until one reports nothing left, then returns
/// the new on-disk size as the baseline for future growth checks.
///
/// A failing pass ends the loop for this tick; the error is logged and
/// never surfaced to foreground callers.
fn reclaim_until_exhausted<E: Engine>(
    engine: &E,
    fallback_baseline: u64,
) -> u64 {
    loop {
        match engine.reclaim_pass(DISCARD_RATIO) {
            Ok(SpaceReclaimed::Reclaimed) => continue,
            Ok(SpaceReclaimed::Exhausted) => break,
            Err(e) => {
                warn!(error = %e, "reclamation pass failed; waiting for next tick");
                break;
            }
        }
    }

    match engine.on_disk_size() {
        Ok(size) => {
            debug!(size, "reclamation baseline updated");
            size
        }
        Err(e) => {
            warn!(error = %e, "failed to refresh reclamation baseline");
            fallback_baseline
        }
    }
}
