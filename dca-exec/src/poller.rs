//! Order poller: fixed-interval status loop.
//!
//! After submission the order is re-fetched every `interval` until it leaves
//! {pending, open}, disappears (cancelled), or has been watched for longer
//! than `warn_after`. The interval is fixed rather than backing off: one order
//! per run, and the run is expected to be short.
//!
//! # State Machine
//!
//! ```text
//!                 ┌──────────── sleep, re-fetch ───────────┐
//!                 ▼                                        │
//! SUBMITTED ─► PENDING / OPEN ──(elapsed > warn_after)──► TIMED_OUT
//!                 │        │
//!                 │        └──(lookup: not found)───────► NOT_FOUND
//!                 ├──(status: rejected)─────────────────► REJECTED_TERMINAL
//!                 └──(any other status)─────────────────► FILLED
//! ```
//!
//! A timeout only stops watching; the order stays live on the exchange.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use dca_domain::{Order, OrderStatus};

use crate::error::ExecResult;
use crate::ports::{ExchangePort, OrderLookup};

// =============================================================================
// Constants
// =============================================================================

/// Seconds between status checks
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Seconds of watching before giving up on an unfilled order
pub const DEFAULT_WARN_AFTER_SECS: u64 = 300;

// =============================================================================
// Configuration
// =============================================================================

/// Poll loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Fixed sleep between status checks
    pub interval: Duration,
    /// Stop watching once more than this has elapsed
    pub warn_after: Duration,
}

impl PollConfig {
    /// Default interval with a custom warn-after threshold.
    pub fn with_warn_after_secs(warn_after_secs: u64) -> Self {
        Self {
            warn_after: Duration::from_secs(warn_after_secs),
            ..Self::default()
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            warn_after: Duration::from_secs(DEFAULT_WARN_AFTER_SECS),
        }
    }
}

// =============================================================================
// Poll State
// =============================================================================

/// Poller lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Submission returned an identifier, nothing observed yet
    Submitted,
    /// Last snapshot: pending
    Pending,
    /// Last snapshot: open
    Open,
    /// Order left {pending, open} (done or any other final status)
    Filled,
    /// Order ended with status `rejected`
    RejectedTerminal,
    /// Exchange no longer knows the order
    NotFound,
    /// Watched longer than `warn_after`
    TimedOut,
}

impl PollPhase {
    /// Terminal phases end the loop; no further polling happens.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollPhase::Filled | PollPhase::RejectedTerminal | PollPhase::NotFound | PollPhase::TimedOut
        )
    }

    fn from_status(status: &OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => PollPhase::Pending,
            OrderStatus::Open => PollPhase::Open,
            OrderStatus::Rejected => PollPhase::RejectedTerminal,
            OrderStatus::Done | OrderStatus::Other(_) => PollPhase::Filled,
        }
    }
}

/// Bookkeeping for one poll loop. Dropped when the loop ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    /// Order being watched
    pub order_id: String,
    /// Total time slept so far
    pub elapsed: Duration,
    /// Sleep before the next check
    pub interval: Duration,
    /// Current phase
    pub phase: PollPhase,
    /// Number of status re-fetches issued
    pub fetches: u32,
}

impl PollState {
    /// Fresh state for a just-submitted order.
    pub fn new(order_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            order_id: order_id.into(),
            elapsed: Duration::ZERO,
            interval,
            phase: PollPhase::Submitted,
            fetches: 0,
        }
    }

    fn observe(&mut self, status: &OrderStatus) {
        self.phase = PollPhase::from_status(status);
    }

    fn advance(&mut self) {
        self.elapsed += self.interval;
        self.fetches += 1;
    }
}

// =============================================================================
// Poll Outcome
// =============================================================================

/// How the poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Order left {pending, open}
    Filled {
        /// Final snapshot
        order: Order,
        /// Time spent watching
        elapsed: Duration,
    },
    /// Order ended with status `rejected`
    Rejected {
        /// Final snapshot
        order: Order,
        /// Time spent watching
        elapsed: Duration,
    },
    /// Lookup reported the order as not found
    Cancelled {
        /// Time spent watching
        elapsed: Duration,
    },
    /// Still working after `warn_after`
    TimedOut {
        /// Last snapshot seen
        order: Order,
        /// Time spent watching
        elapsed: Duration,
    },
}

impl PollOutcome {
    /// Terminal phase this outcome corresponds to.
    pub fn phase(&self) -> PollPhase {
        match self {
            PollOutcome::Filled { .. } => PollPhase::Filled,
            PollOutcome::Rejected { .. } => PollPhase::RejectedTerminal,
            PollOutcome::Cancelled { .. } => PollPhase::NotFound,
            PollOutcome::TimedOut { .. } => PollPhase::TimedOut,
        }
    }

    /// Time spent watching before the loop ended.
    pub fn elapsed(&self) -> Duration {
        match self {
            PollOutcome::Filled { elapsed, .. }
            | PollOutcome::Rejected { elapsed, .. }
            | PollOutcome::Cancelled { elapsed }
            | PollOutcome::TimedOut { elapsed, .. } => *elapsed,
        }
    }
}

// =============================================================================
// Order Poller
// =============================================================================

/// Watches one order until it reaches a terminal phase.
pub struct OrderPoller<'a, E: ExchangePort + ?Sized> {
    exchange: &'a E,
    config: PollConfig,
}

impl<'a, E: ExchangePort + ?Sized> OrderPoller<'a, E> {
    /// Create a poller over `exchange`.
    pub fn new(exchange: &'a E, config: PollConfig) -> Self {
        Self { exchange, config }
    }

    /// Poll starting from the snapshot returned by submission.
    ///
    /// # Errors
    ///
    /// Transport errors from a status lookup end the loop immediately; they
    /// are not retried.
    pub async fn poll(&self, initial: Order) -> ExecResult<PollOutcome> {
        let mut state = PollState::new(initial.id.clone(), self.config.interval);
        let mut order = initial;

        loop {
            state.observe(&order.status);

            match state.phase {
                PollPhase::Filled => {
                    info!(order_id = %state.order_id, status = %order.status, fetches = state.fetches, "Order finished");
                    return Ok(PollOutcome::Filled { order, elapsed: state.elapsed });
                },
                PollPhase::RejectedTerminal => {
                    warn!(order_id = %state.order_id, "Order ended rejected");
                    return Ok(PollOutcome::Rejected { order, elapsed: state.elapsed });
                },
                _ => {},
            }

            if state.elapsed > self.config.warn_after {
                state.phase = PollPhase::TimedOut;
                warn!(
                    order_id = %state.order_id,
                    status = %order.status,
                    elapsed_secs = state.elapsed.as_secs(),
                    "Order still working after warn-after threshold, no longer watching"
                );
                return Ok(PollOutcome::TimedOut { order, elapsed: state.elapsed });
            }

            info!(
                order_id = %state.order_id,
                status = %order.status,
                sleep_secs = state.interval.as_secs(),
                total_secs = state.elapsed.as_secs(),
                "Order still working, sleeping"
            );
            sleep(state.interval).await;
            state.advance();

            match self.exchange.get_order(&state.order_id).await? {
                OrderLookup::Found(next) => order = next,
                OrderLookup::NotFound => {
                    state.phase = PollPhase::NotFound;
                    warn!(order_id = %state.order_id, "Order not found, treating as cancelled");
                    return Ok(PollOutcome::Cancelled { elapsed: state.elapsed });
                },
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
