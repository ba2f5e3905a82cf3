//! Execution layer port definitions.
//!
//! Ports define the interfaces for external services (exchange, notifications).
//! Adapters implement these ports for specific services (Coinbase Pro,
//! Pushover, stubs).

use async_trait::async_trait;

use dca_domain::{Order, OrderRequest, Product};

use crate::error::ExecError;

// =============================================================================
// Exchange Port
// =============================================================================

/// Port for the three exchange calls a run needs.
///
/// Implementations:
/// - `StubExchange` - For testing (scripted replies)
/// - `CoinbaseExchange` - Coinbase Pro REST (in the bot binary)
#[async_trait]
pub trait ExchangePort: Send + Sync {
    /// Fetch the full product catalog.
    async fn get_products(&self) -> Result<Vec<Product>, ExecError>;

    /// Place a market order.
    ///
    /// # Returns
    ///
    /// `OrderReply::Failed` when the exchange answers with an error message,
    /// `OrderReply::Placed` with the order snapshot otherwise (including
    /// rejected orders). Transport failures are `Err`.
    async fn place_market_order(&self, request: &OrderRequest) -> Result<OrderReply, ExecError>;

    /// Fetch the current snapshot of an order.
    ///
    /// # Returns
    ///
    /// `OrderLookup::NotFound` when the exchange no longer knows the order
    /// (cancelled before any fill).
    async fn get_order(&self, order_id: &str) -> Result<OrderLookup, ExecError>;
}

/// Immediate reply to an order placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderReply {
    /// Exchange created an order (its status may still be `rejected`)
    Placed(Order),
    /// Exchange refused the request with a message
    Failed {
        /// Exchange message, verbatim
        message: String,
    },
}

/// Result of looking up an order by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLookup {
    /// Current snapshot
    Found(Order),
    /// Exchange reports the order as not found
    NotFound,
}

// =============================================================================
// Notifier Port
// =============================================================================

/// Port for human-readable status notifications.
///
/// `send` never fails: implementations log delivery problems and return
/// `false`.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message`. Returns whether delivery succeeded.
    async fn send(&self, message: &str) -> bool;
}

/// An absent notifier (push disabled) drops every message.
#[async_trait]
impl<N: Notifier> Notifier for Option<N> {
    async fn send(&self, message: &str) -> bool {
        match self {
            Some(notifier) => notifier.send(message).await,
            None => {
                tracing::debug!("Notifications disabled, not sending");
                false
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
