//! Stub implementations for testing.
//!
//! These implementations replay scripted exchange replies and record
//! notifications without making real API calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dca_domain::{Order, OrderRequest, OrderStatus, Product};

use crate::error::ExecError;
use crate::ports::{ExchangePort, Notifier, OrderLookup, OrderReply};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Stub Exchange
// =============================================================================

/// Stub exchange for testing.
///
/// Serves a fixed product catalog, answers placements with a configured
/// reply, and replays a queue of order lookups. The last queued lookup is
/// sticky: once the queue is down to one entry it is returned forever.
pub struct StubExchange {
    /// Catalog returned by `get_products`
    products: Vec<Product>,
    /// Reply to every placement
    placement: Mutex<OrderReply>,
    /// Scripted lookups, front first
    lookups: Mutex<VecDeque<OrderLookup>>,
    /// Every request passed to `place_market_order`
    placed: Mutex<Vec<OrderRequest>>,
    /// Number of `get_order` calls
    lookup_count: Mutex<usize>,
    /// Whether to simulate a transport failure on the next call
    fail_next: Mutex<bool>,
}

impl StubExchange {
    /// Create a stub serving `products`.
    ///
    /// Placements default to an accepted pending order with id `STUB-1`.
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            placement: Mutex::new(OrderReply::Placed(Order {
                id: "STUB-1".to_string(),
                status: OrderStatus::Pending,
                ..Default::default()
            })),
            lookups: Mutex::new(VecDeque::new()),
            placed: Mutex::new(Vec::new()),
            lookup_count: Mutex::new(0),
            fail_next: Mutex::new(false),
        }
    }

    /// Set the reply to order placements.
    pub fn set_placement(&self, reply: OrderReply) {
        *lock(&self.placement) = reply;
    }

    /// Queue a reply for the next `get_order` call.
    pub fn push_lookup(&self, lookup: OrderLookup) {
        lock(&self.lookups).push_back(lookup);
    }

    /// Requests seen by `place_market_order`, in order.
    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        lock(&self.placed).clone()
    }

    /// Number of status lookups issued.
    pub fn lookup_count(&self) -> usize {
        *lock(&self.lookup_count)
    }

    /// Configure the next call to fail with a transport error.
    pub fn set_fail_next(&self, fail: bool) {
        *lock(&self.fail_next) = fail;
    }

    /// Check if we should fail the next operation.
    fn should_fail(&self) -> bool {
        let mut fail_next = lock(&self.fail_next);
        let fail = *fail_next;
        *fail_next = false;
        fail
    }
}

#[async_trait]
impl ExchangePort for StubExchange {
    async fn get_products(&self) -> Result<Vec<Product>, ExecError> {
        if self.should_fail() {
            return Err(ExecError::Transport("Simulated products fetch failure".to_string()));
        }
        Ok(self.products.clone())
    }

    async fn place_market_order(&self, request: &OrderRequest) -> Result<OrderReply, ExecError> {
        lock(&self.placed).push(request.clone());

        if self.should_fail() {
            return Err(ExecError::Transport("Simulated placement failure".to_string()));
        }

        Ok(lock(&self.placement).clone())
    }

    async fn get_order(&self, order_id: &str) -> Result<OrderLookup, ExecError> {
        *lock(&self.lookup_count) += 1;

        if self.should_fail() {
            return Err(ExecError::Transport("Simulated order lookup failure".to_string()));
        }

        let mut lookups = lock(&self.lookups);
        let lookup = if lookups.len() > 1 {
            lookups.pop_front()
        } else {
            lookups.front().cloned()
        };

        tracing::debug!(order_id, "Stub: order lookup");
        Ok(lookup.unwrap_or(OrderLookup::NotFound))
    }
}

// =============================================================================
// Recording Notifier
// =============================================================================

/// Notifier that keeps every message in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingNotifier {
    /// Notifier that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier that records messages but reports every delivery as failed.
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// Messages received so far, in order.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> bool {
        lock(&self.messages).push(message.to_string());
        !self.failing
    }
}

// =============================================================================
// Tests
// =============================================================================
