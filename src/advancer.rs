//! Periodic step advancement.
//!
//! A single sweep task drives all advancement; there are no per-order
//! timers. Each sweep scans for orders with a due step, promotes every step
//! whose time has arrived and whose predecessors are complete, marks the
//! next step current, and commits the whole promotion in one conditional
//! write. Conflicts retry once against fresh state and otherwise defer to
//! the next sweep; no error halts the loop.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::events::{EventPublisher, FulfillmentEvent};
use crate::models::{Order, StepStatus};
use crate::progress;
use crate::store::{with_deadline, OrderStore, StoreError, VersionedOrder};

/// Tuning knobs for the sweep loop. Interval and timeout are configuration
/// values, not contracts.
#[derive(Debug, Clone)]
pub struct AdvancerConfig {
    /// Delay between sweeps.
    pub sweep_interval: Duration,
    /// Deadline for each individual store call.
    pub store_timeout: Duration,
    /// Upper bound on orders examined per sweep.
    pub max_orders_per_sweep: usize,
}

impl Default for AdvancerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300),
            store_timeout: Duration::from_secs(5),
            max_orders_per_sweep: 100,
        }
    }
}

/// Counters for one sweep, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub orders_seen: usize,
    pub orders_advanced: usize,
    pub steps_completed: usize,
    pub conflicts: usize,
    pub orders_skipped: usize,
}

/// A step promotion recorded while rewriting an order's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Promotion {
    step_index: usize,
    step_name: String,
}

/// The recurring process that promotes due steps.
///
/// Sole writer of step-completion state: ingestion only writes at creation,
/// so no order is ever mutated by two different actors by design (racing
/// advancer instances are resolved by the store's version tokens).
pub struct StepAdvancer {
    store: Arc<dyn OrderStore>,
    publisher: EventPublisher,
    config: AdvancerConfig,
    stop_requested: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl StepAdvancer {
    pub fn new(
        store: Arc<dyn OrderStore>,
        publisher: EventPublisher,
        config: AdvancerConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            config,
            stop_requested: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Run sweeps at the configured interval until [`Self::stop`] is called.
    /// Sweep failures are logged and self-heal on the next cycle.
    pub async fn run(&self) {
        info!(
            interval_seconds = self.config.sweep_interval.as_secs(),
            "step advancer started"
        );
        while !self.stop_requested.load(Ordering::Acquire) {
            let stats = self.sweep_at(Utc::now()).await;
            if stats.orders_seen > 0 {
                info!(
                    orders_seen = stats.orders_seen,
                    orders_advanced = stats.orders_advanced,
                    steps_completed = stats.steps_completed,
                    conflicts = stats.conflicts,
                    orders_skipped = stats.orders_skipped,
                    "sweep finished"
                );
            }

            tokio::select! {
                () = tokio::time::sleep(self.config.sweep_interval) => {}
                () = self.shutdown.notified() => break,
            }
        }
        info!("step advancer stopped");
    }

    /// Request a graceful stop. The current order finishes; the sweep exits
    /// at the next order boundary, leaving every order in a valid state.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.shutdown.notify_waiters();
    }

    /// Execute one sweep against an explicit clock reading.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepStats {
        let mut stats = SweepStats::default();

        let due = match with_deadline(
            self.config.store_timeout,
            self.store
                .find_with_due_steps(now, self.config.max_orders_per_sweep),
        )
        .await
        {
            Ok(due) => due,
            Err(err) => {
                error!(error = %err, "due-order scan failed, deferring to next sweep");
                return stats;
            }
        };

        stats.orders_seen = due.len();
        for versioned in due {
            // Cooperative cancellation between orders.
            if self.stop_requested.load(Ordering::Acquire) {
                debug!("sweep cancelled mid-cycle");
                break;
            }

            let order_id = versioned.order.id;
            match self.advance_order(versioned, now).await {
                Ok(Some((stored, promotions))) => {
                    stats.orders_advanced += 1;
                    stats.steps_completed += promotions.len();
                    self.emit_completions(&stored, &promotions, now);
                }
                Ok(None) => {}
                Err(StoreError::Conflict { .. }) => {
                    // Lost to a racing writer twice; the next sweep re-reads.
                    stats.conflicts += 1;
                    debug!(order_id = %order_id, "promotion deferred after repeated conflict");
                }
                Err(err) => {
                    stats.orders_skipped += 1;
                    warn!(order_id = %order_id, error = %err, "order skipped for this sweep");
                }
            }
        }

        stats
    }

    /// Promote all due steps on one order and commit in a single write.
    /// Returns `None` when nothing was due (e.g. a racer already advanced it).
    async fn advance_order(
        &self,
        mut versioned: VersionedOrder,
        now: DateTime<Utc>,
    ) -> Result<Option<(VersionedOrder, Vec<Promotion>)>, StoreError> {
        let mut retried = false;
        loop {
            let (updated, promotions) = promote_due_steps(versioned.order.clone(), now);
            if promotions.is_empty() {
                return Ok(None);
            }

            match with_deadline(
                self.config.store_timeout,
                self.store.update(versioned.version, updated),
            )
            .await
            {
                Ok(stored) => return Ok(Some((stored, promotions))),
                Err(err @ StoreError::Conflict { .. }) => {
                    if retried {
                        return Err(err);
                    }
                    retried = true;
                    // Reload and retry once against fresh state.
                    versioned = with_deadline(
                        self.config.store_timeout,
                        self.store.get(versioned.order.id),
                    )
                    .await?
                    .ok_or_else(|| {
                        StoreError::Unavailable(format!(
                            "order {} vanished during conflict retry",
                            versioned.order.id
                        ))
                    })?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Emit one event per promoted step. Emission happens after the write
    /// committed and can never roll it back.
    fn emit_completions(&self, stored: &VersionedOrder, promotions: &[Promotion], now: DateTime<Utc>) {
        let progress = progress::compute(&stored.order.custom_steps);
        let order_completed = stored.order.is_completed();
        for promotion in promotions {
            self.publisher.publish(FulfillmentEvent::StepCompleted {
                order_id: stored.order.id,
                store_id: stored.order.store_id.clone(),
                customer_email: stored.order.customer_email.clone(),
                step_index: promotion.step_index,
                step_name: promotion.step_name.clone(),
                completed_at: now,
                progress_percent: progress.percent,
                order_completed,
            });
        }
    }
}

/// Walk the timeline in positional order, completing every step whose
/// scheduled time has arrived and whose predecessors are all completed,
/// then mark the earliest incomplete step current regardless of its own
/// schedule (it is now the visible "in progress" step).
///
/// Pure over the order value; persistence and events live with the caller.
fn promote_due_steps(mut order: Order, now: DateTime<Utc>) -> (Order, Vec<Promotion>) {
    let mut promotions = Vec::new();

    for (i, step) in order.custom_steps.iter_mut().enumerate() {
        if step.is_completed() {
            continue;
        }
        if step.scheduled_at <= now {
            step.status = StepStatus::Completed { at: now };
            promotions.push(Promotion {
                step_index: i,
                step_name: step.name.clone(),
            });
        } else {
            // Not due; later steps must wait for this predecessor even if
            // their own schedules elapsed earlier (clock skew). No skipping.
            break;
        }
    }

    if !promotions.is_empty() {
        if let Some(next) = order.first_incomplete_index() {
            order.custom_steps[next].status = StepStatus::Current;
        }
    }

    (order, promotions)
}
