//! Background worker that writes cart snapshots to the repository.
//!
//! The worker consumes a single-slot `watch` channel: every mutation replaces
//! the pending snapshot, and the worker always writes the newest one it can
//! see. A burst of mutations therefore collapses into one trailing write of
//! the final state, and the last completed write always carries the last
//! applied revision.
//!
//! Writes are retried with exponential backoff on [`CartError::StorageWrite`].
//! Outcomes are published on a second `watch` channel as [`PersistStatus`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::domain::CartSnapshot;
use crate::domain::repositories::CartRepository;
use crate::error::CartError;

/// Tuning for the persistence worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistSettings {
    /// Quiet period before writing, restarted by every further change.
    /// Zero writes immediately.
    pub debounce: Duration,
    /// Retries after the first failed attempt. Zero disables retry.
    pub retry_attempts: usize,
    /// First retry delay; doubles on each further retry.
    pub retry_base: Duration,
}

impl Default for PersistSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::ZERO,
            retry_attempts: 3,
            retry_base: Duration::from_millis(50),
        }
    }
}

impl PersistSettings {
    fn retry_strategy(&self) -> impl Iterator<Item = Duration> + use<> {
        let base_ms = u64::try_from(self.retry_base.as_millis()).unwrap_or(u64::MAX);

        ExponentialBackoff::from_millis(2)
            .factor(base_ms.div_ceil(2).max(1))
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(self.retry_attempts)
    }
}

/// Result of the most recent completed persistence step.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    /// Nothing written yet; the revision was loaded from storage at startup.
    Restored,
    /// The snapshot was written.
    Saved,
    /// The write failed after all retries.
    Failed(CartError),
}

/// Last revision the worker finished with, and how it went.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistStatus {
    pub revision: u64,
    pub outcome: PersistOutcome,
}

impl PersistStatus {
    pub(crate) fn restored(revision: u64) -> Self {
        Self {
            revision,
            outcome: PersistOutcome::Restored,
        }
    }
}

/// Runs until the pending channel closes or `shutdown` fires.
///
/// On shutdown, a snapshot that has not been written yet is written before
/// the worker exits.
pub async fn run_persist_worker<R>(
    mut pending: watch::Receiver<CartSnapshot>,
    repository: Arc<R>,
    status: watch::Sender<PersistStatus>,
    settings: PersistSettings,
    mut shutdown: oneshot::Receiver<()>,
) where
    R: CartRepository + ?Sized,
{
    let mut last_written = status.borrow().revision;
    let mut closing = false;

    loop {
        if !closing {
            tokio::select! {
                biased;
                changed = pending.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = &mut shutdown => closing = true,
            }
        }

        // Each change inside the quiet period restarts it.
        while !closing && !settings.debounce.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(settings.debounce) => break,
                changed = pending.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = &mut shutdown => closing = true,
            }
        }

        let snapshot = pending.borrow_and_update().clone();
        if snapshot.revision > last_written {
            let skipped = snapshot.revision - last_written - 1;
            if skipped > 0 {
                debug!(skipped, revision = snapshot.revision, "Coalesced cart writes");
                metrics::counter!("cart_persist_coalesced_total").increment(skipped);
            }

            let outcome = write_snapshot(repository.as_ref(), &snapshot, &settings).await;
            last_written = snapshot.revision;
            status.send_replace(PersistStatus {
                revision: snapshot.revision,
                outcome,
            });
        }

        if closing {
            break;
        }
    }

    info!(revision = last_written, "Cart persistence worker stopped");
}

async fn write_snapshot<R>(
    repository: &R,
    snapshot: &CartSnapshot,
    settings: &PersistSettings,
) -> PersistOutcome
where
    R: CartRepository + ?Sized,
{
    let result = RetryIf::start(
        settings.retry_strategy(),
        || repository.save(&snapshot.cart),
        |e: &CartError| {
            let retry = matches!(e, CartError::StorageWrite(_));
            if retry {
                debug!(error = %e, revision = snapshot.revision, "Retrying cart write");
            }
            retry
        },
    )
    .await;

    match result {
        Ok(()) => {
            debug!(
                revision = snapshot.revision,
                items = snapshot.cart.len(),
                "Cart persisted"
            );
            metrics::counter!("cart_persist_writes_total").increment(1);
            PersistOutcome::Saved
        }
        Err(e) => {
            warn!(error = %e, revision = snapshot.revision, "Failed to persist cart");
            metrics::counter!("cart_persist_failures_total").increment(1);
            PersistOutcome::Failed(e)
        }
    }
}
