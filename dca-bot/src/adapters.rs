//! Port adapters over the REST clients.
//!
//! `CoinbaseExchange` implements `ExchangePort`. `PushoverNotifier` and
//! `ConsoleNotifier` implement `Notifier`, so the execution layer never sees
//! HTTP types or stdout.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use dca_connectors::{CoinbaseReply, CoinbaseRestClient, CoinbaseRestError, PushoverClient, NOT_FOUND_MESSAGE};
use dca_domain::{Order, OrderRequest, Product};
use dca_exec::{ExchangePort, ExecError, Notifier, OrderLookup, OrderReply};

use crate::app::timestamp;
use crate::config::PushoverSettings;

fn transport(err: CoinbaseRestError) -> ExecError {
    ExecError::Transport(err.to_string())
}

// =============================================================================
// Coinbase Exchange
// =============================================================================

/// `ExchangePort` backed by the Coinbase Pro REST API.
pub struct CoinbaseExchange {
    client: CoinbaseRestClient,
}

impl CoinbaseExchange {
    /// Wrap a configured client.
    pub fn new(client: CoinbaseRestClient) -> Self {
        Self { client }
    }
}

/// An exchange message in reply to a placement is a refusal.
fn placement_from_reply(reply: CoinbaseReply<Order>) -> OrderReply {
    match reply {
        CoinbaseReply::Ok(order) => OrderReply::Placed(order),
        CoinbaseReply::Message { message, .. } => OrderReply::Failed { message },
    }
}

/// `NotFound` (or a 404) means the order is gone; any other message is an
/// unexpected API error.
fn lookup_from_reply(reply: CoinbaseReply<Order>) -> Result<OrderLookup, ExecError> {
    match reply {
        CoinbaseReply::Ok(order) => Ok(OrderLookup::Found(order)),
        CoinbaseReply::Message { status, message } if status == 404 || message == NOT_FOUND_MESSAGE => {
            Ok(OrderLookup::NotFound)
        },
        CoinbaseReply::Message { message, .. } => Err(transport(CoinbaseRestError::ApiError(message))),
    }
}

#[async_trait]
impl ExchangePort for CoinbaseExchange {
    async fn get_products(&self) -> Result<Vec<Product>, ExecError> {
        self.client.get_products().await.map_err(transport)
    }

    async fn place_market_order(&self, request: &OrderRequest) -> Result<OrderReply, ExecError> {
        let reply = self.client.place_market_order(request).await.map_err(transport)?;
        Ok(placement_from_reply(reply))
    }

    async fn get_order(&self, order_id: &str) -> Result<OrderLookup, ExecError> {
        let reply = self.client.get_order(order_id).await.map_err(transport)?;
        lookup_from_reply(reply)
    }
}

// =============================================================================
// Pushover Notifier
// =============================================================================

/// `Notifier` that forwards every status line to Pushover.
pub struct PushoverNotifier {
    client: PushoverClient,
}

impl PushoverNotifier {
    /// Wrap a configured client.
    pub fn new(client: PushoverClient) -> Self {
        Self { client }
    }

    /// Client for the public Pushover API.
    pub fn from_settings(settings: &PushoverSettings) -> Self {
        Self::new(PushoverClient::new(settings.app_token.clone(), settings.user_key.clone()))
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn send(&self, message: &str) -> bool {
        match self.client.send_message(message).await {
            Ok(delivered) => delivered,
            Err(e) => {
                warn!(error = %e, "Push notification failed");
                false
            },
        }
    }
}

// =============================================================================
// Console Notifier
// =============================================================================

/// `Notifier` that prints each status line to stdout as it is decided, then
/// hands it on to `inner`.
pub struct ConsoleNotifier<N> {
    inner: Arc<N>,
}

impl<N: Notifier> ConsoleNotifier<N> {
    /// Print in front of `inner`.
    pub fn new(inner: Arc<N>) -> Self {
        Self { inner }
    }
}

/// Timestamped form of a status line as printed on the console.
pub fn console_line(message: &str) -> String {
    format!("{}: {}", timestamp(), message)
}

#[async_trait]
impl<N: Notifier> Notifier for ConsoleNotifier<N> {
    async fn send(&self, message: &str) -> bool {
        println!("{}", console_line(message));
        self.inner.send(message).await
    }
}

// =============================================================================
// Tests
// =============================================================================
