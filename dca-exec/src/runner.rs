//! Runner: one market order from request to final report.
//!
//! # Flow
//!
//! ```text
//! get_products → resolve_market → normalize → submit → poll → report
//! ```
//!
//! Every stage can short-circuit to a terminal report. Each status line is
//! pushed to the notifier as soon as it is decided.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use dca_domain::{resolve_market, Order, OrderRequest, OrderSide};

use crate::error::{ExecError, ExecResult};
use crate::poller::{OrderPoller, PollConfig, PollOutcome};
use crate::ports::{ExchangePort, Notifier};
use crate::submitter::{submit_order, Submission};

// =============================================================================
// Request and Configuration
// =============================================================================

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRequest {
    /// Market pair (e.g., "BTC-USD")
    pub market: String,
    /// Buy or sell
    pub side: OrderSide,
    /// Amount as given, before normalization
    pub amount: Decimal,
    /// Currency `amount` is expressed in (base or quote of `market`)
    pub amount_currency: String,
}

impl TradeRequest {
    /// Prefix shared by the poll-phase status lines.
    pub fn describe(&self) -> String {
        format!(
            "{} {} order of {} {}",
            self.market, self.side, self.amount, self.amount_currency
        )
    }
}

/// What to do when the exchange creates the order with status `rejected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RejectionPolicy {
    /// Report the rejection, then hand the order to the poller anyway
    #[default]
    PollAnyway,
    /// Report the rejection and end the run
    Stop,
}

/// Runner settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Poll loop timing
    pub poll: PollConfig,
    /// Behaviour on immediate rejection
    pub rejection_policy: RejectionPolicy,
}

// =============================================================================
// Outcome and Report
// =============================================================================

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Exchange refused the request with a message
    SubmissionFailed {
        /// Exchange message, verbatim
        message: String,
    },
    /// Order ended rejected
    Rejected {
        /// Last snapshot
        order: Order,
    },
    /// Order left {pending, open}
    Filled {
        /// Final snapshot
        order: Order,
        /// Average execution price, `None` when nothing was filled
        market_price: Option<Decimal>,
    },
    /// Order disappeared while being watched
    Cancelled,
    /// Still working after warn-after; left live on the exchange
    TimedOut {
        /// Last snapshot
        order: Order,
    },
}

impl RunOutcome {
    /// Process exit code when distinct exit codes are enabled.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Filled { .. } => 0,
            RunOutcome::SubmissionFailed { .. } => 2,
            RunOutcome::Rejected { .. } => 3,
            RunOutcome::Cancelled => 4,
            RunOutcome::TimedOut { .. } => 5,
        }
    }
}

/// Result of a run: the outcome plus every status line produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Terminal outcome
    pub outcome: RunOutcome,
    /// Status lines in the order they were decided; the last one is final
    pub lines: Vec<String>,
}

impl RunReport {
    /// Final status line.
    pub fn message(&self) -> &str {
        self.lines.last().map(String::as_str).unwrap_or_default()
    }
}

// =============================================================================
// Order Runner
// =============================================================================

/// Drives a single order through its lifecycle.
pub struct OrderRunner<E: ExchangePort, N: Notifier> {
    /// Exchange port for catalog, placement and lookups
    exchange: Arc<E>,
    /// Receives every status line
    notifier: Arc<N>,
    config: RunnerConfig,
}

impl<E: ExchangePort, N: Notifier> OrderRunner<E, N> {
    /// Create a new runner.
    pub fn new(exchange: Arc<E>, notifier: Arc<N>, config: RunnerConfig) -> Self {
        Self {
            exchange,
            notifier,
            config,
        }
    }

    /// Run `trade` to a terminal report.
    ///
    /// # Errors
    ///
    /// - `ExecError::Domain` when the market or currency is unknown, or the
    ///   amount is invalid (nothing is placed)
    /// - `ExecError::Transport` on any network failure, including during polling
    /// - `ExecError::InvalidState` when an accepted order carries no identifier
    pub async fn run(&self, trade: &TradeRequest) -> ExecResult<RunReport> {
        let products = self.exchange.get_products().await?;
        debug!(count = products.len(), "Fetched product catalog");

        let selection = resolve_market(&products, &trade.market, &trade.amount_currency)?;
        info!(
            product_id = %selection.product.id,
            base_min_size = %selection.product.base_min_size,
            base_increment = %selection.product.base_increment,
            quote_increment = %selection.product.quote_increment,
            quote_denominated = selection.is_quote_denominated(),
            "Resolved market"
        );

        let request = OrderRequest::market(&selection, trade.side, trade.amount)?;
        let mut lines = Vec::new();

        let order = match submit_order(self.exchange.as_ref(), &request).await? {
            Submission::Failed { message } => {
                let line = format!(
                    "Could not place {} {} order\nResponse: {}",
                    trade.market, trade.side, message
                );
                self.emit(&mut lines, line).await;
                return Ok(RunReport {
                    outcome: RunOutcome::SubmissionFailed { message },
                    lines,
                });
            },
            Submission::Rejected(order) => {
                self.emit(&mut lines, format!("{} Order rejected", trade.market))
                    .await;

                if self.config.rejection_policy == RejectionPolicy::Stop || !order.has_id() {
                    return Ok(RunReport {
                        outcome: RunOutcome::Rejected { order },
                        lines,
                    });
                }
                warn!(order_id = %order.id, "Polling rejected order");
                order
            },
            Submission::Accepted(order) => {
                if !order.has_id() {
                    return Err(ExecError::InvalidState(
                        "Exchange accepted the order without an identifier".to_string(),
                    ));
                }
                order
            },
        };

        info!(order_id = %order.id, "Polling order");
        let poller = OrderPoller::new(self.exchange.as_ref(), self.config.poll);
        let quote_increment = selection.product.quote_increment;

        let (outcome, line) = match poller.poll(order).await? {
            PollOutcome::Filled { order, .. } => {
                let market_price = order.average_price(quote_increment);
                let line = self.final_line(trade, &order, market_price, &selection.product.quote_currency);
                (RunOutcome::Filled { order, market_price }, line)
            },
            PollOutcome::Rejected { order, .. } => {
                let market_price = order.average_price(quote_increment);
                let line = self.final_line(trade, &order, market_price, &selection.product.quote_currency);
                (RunOutcome::Rejected { order }, line)
            },
            PollOutcome::Cancelled { .. } => {
                (RunOutcome::Cancelled, format!("{} CANCELLED", trade.describe()))
            },
            PollOutcome::TimedOut { order, .. } => (
                RunOutcome::TimedOut { order },
                format!("{} OPEN/UNFILLED", trade.describe()),
            ),
        };

        self.emit(&mut lines, line).await;
        Ok(RunReport { outcome, lines })
    }

    fn final_line(
        &self,
        trade: &TradeRequest,
        order: &Order,
        market_price: Option<Decimal>,
        quote_currency: &str,
    ) -> String {
        match market_price {
            Some(price) => format!(
                "{} {} @ {} {}",
                trade.describe(),
                order.status,
                price,
                quote_currency
            ),
            None => format!("{} {}", trade.describe(), order.status),
        }
    }

    async fn emit(&self, lines: &mut Vec<String>, line: String) {
        info!(status = %line, "Order status");
        let delivered = self.notifier.send(&line).await;
        debug!(delivered, "Status notification");
        lines.push(line);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{OrderLookup, OrderReply};
    use crate::stub::{RecordingNotifier, StubExchange};
    use dca_domain::{DomainError, Increment, OrderQuantity, OrderStatus, Product};
    use rust_decimal_macros::dec;

    fn btc_usd() -> Product {
        Product {
            id: "BTC-USD".to_string(),
            base_currency: "BTC".to_string(),
            quote_currency: "USD".to_string(),
            base_min_size: dec!(0.0001),
            base_increment: Increment::new(dec!(0.00000001)).unwrap(),
            quote_increment: Increment::new(dec!(0.01)).unwrap(),
        }
    }

    fn trade(amount: Decimal, currency: &str) -> TradeRequest {
        TradeRequest {
            market: "BTC-USD".to_string(),
            side: OrderSide::Buy,
            amount,
            amount_currency: currency.to_string(),
        }
    }

    fn order(status: OrderStatus) -> Order {
        Order {
            id: "abc123".to_string(),
            status,
            ..Default::default()
        }
    }

    fn runner(
        exchange: &Arc<StubExchange>,
        notifier: &Arc<RecordingNotifier>,
        policy: RejectionPolicy,
    ) -> OrderRunner<StubExchange, RecordingNotifier> {
        let config = RunnerConfig {
            poll: PollConfig::default(),
            rejection_policy: policy,
        };
        OrderRunner::new(exchange.clone(), notifier.clone(), config)
    }

    #[test]
    fn test_describe() {
        assert_eq!(trade(dec!(14), "USD").describe(), "BTC-USD buy order of 14 USD");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunOutcome::Filled { order: Order::default(), market_price: None }.exit_code(), 0);
        assert_eq!(RunOutcome::SubmissionFailed { message: String::new() }.exit_code(), 2);
        assert_eq!(RunOutcome::Rejected { order: Order::default() }.exit_code(), 3);
        assert_eq!(RunOutcome::Cancelled.exit_code(), 4);
        assert_eq!(RunOutcome::TimedOut { order: Order::default() }.exit_code(), 5);
    }

    #[tokio::test]
    async fn test_unknown_market_places_nothing() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut request = trade(dec!(14), "USD");
        request.market = "DOGE-USD".to_string();

        let result = runner(&exchange, &notifier, RejectionPolicy::default()).run(&request).await;

        assert!(matches!(
            result,
            Err(ExecError::Domain(DomainError::MarketNotFound(ref m))) if m == "DOGE-USD"
        ));
        assert!(exchange.placed_orders().is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_currency_mismatch_places_nothing() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        let notifier = Arc::new(RecordingNotifier::new());

        let result = runner(&exchange, &notifier, RejectionPolicy::default())
            .run(&trade(dec!(14), "EUR"))
            .await;

        assert!(matches!(result, Err(ExecError::Domain(DomainError::CurrencyMismatch { .. }))));
        assert!(exchange.placed_orders().is_empty());
    }

    #[tokio::test]
    async fn test_base_amount_becomes_size() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        exchange.set_placement(OrderReply::Placed(order(OrderStatus::Done)));
        let notifier = Arc::new(RecordingNotifier::new());

        runner(&exchange, &notifier, RejectionPolicy::default())
            .run(&trade(dec!(0.123456789), "BTC"))
            .await
            .unwrap();

        let placed = exchange.placed_orders();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].quantity, OrderQuantity::Size(dec!(0.12345679)));
    }

    #[tokio::test]
    async fn test_submission_failure_reports_message() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        exchange.set_placement(OrderReply::Failed {
            message: "Insufficient funds".to_string(),
        });
        let notifier = Arc::new(RecordingNotifier::new());

        let report = runner(&exchange, &notifier, RejectionPolicy::default())
            .run(&trade(dec!(14), "USD"))
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            RunOutcome::SubmissionFailed {
                message: "Insufficient funds".to_string()
            }
        );
        assert_eq!(report.message(), "Could not place BTC-USD buy order\nResponse: Insufficient funds");
        assert_eq!(notifier.messages(), report.lines);
        assert_eq!(exchange.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_rejection_with_stop_policy() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        exchange.set_placement(OrderReply::Placed(order(OrderStatus::Rejected)));
        let notifier = Arc::new(RecordingNotifier::new());

        let report = runner(&exchange, &notifier, RejectionPolicy::Stop)
            .run(&trade(dec!(14), "USD"))
            .await
            .unwrap();

        assert_eq!(report.outcome.exit_code(), 3);
        assert_eq!(report.lines, vec!["BTC-USD Order rejected".to_string()]);
        assert_eq!(notifier.messages(), report.lines);
    }

    #[tokio::test]
    async fn test_rejection_falls_through_to_poller() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        exchange.set_placement(OrderReply::Placed(order(OrderStatus::Rejected)));
        let notifier = Arc::new(RecordingNotifier::new());

        let report = runner(&exchange, &notifier, RejectionPolicy::PollAnyway)
            .run(&trade(dec!(14), "USD"))
            .await
            .unwrap();

        assert!(matches!(report.outcome, RunOutcome::Rejected { .. }));
        assert_eq!(
            report.lines,
            vec![
                "BTC-USD Order rejected".to_string(),
                "BTC-USD buy order of 14 USD rejected".to_string(),
            ]
        );
        assert_eq!(notifier.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_rejection_without_id_always_stops() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        exchange.set_placement(OrderReply::Placed(Order {
            status: OrderStatus::Rejected,
            ..Default::default()
        }));
        let notifier = Arc::new(RecordingNotifier::new());

        let report = runner(&exchange, &notifier, RejectionPolicy::PollAnyway)
            .run(&trade(dec!(14), "USD"))
            .await
            .unwrap();

        assert_eq!(report.lines.len(), 1);
        assert_eq!(exchange.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_accepted_without_id_is_invalid_state() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        exchange.set_placement(OrderReply::Placed(Order {
            status: OrderStatus::Pending,
            ..Default::default()
        }));
        let notifier = Arc::new(RecordingNotifier::new());

        let result = runner(&exchange, &notifier, RejectionPolicy::default())
            .run(&trade(dec!(14), "USD"))
            .await;

        assert!(matches!(result, Err(ExecError::InvalidState(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_without_fill_omits_price() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        exchange.set_placement(OrderReply::Placed(order(OrderStatus::Pending)));
        exchange.push_lookup(OrderLookup::Found(Order {
            filled_size: Some(Decimal::ZERO),
            executed_value: Some(Decimal::ZERO),
            ..order(OrderStatus::Done)
        }));
        let notifier = Arc::new(RecordingNotifier::new());

        let report = runner(&exchange, &notifier, RejectionPolicy::default())
            .run(&trade(dec!(14), "USD"))
            .await
            .unwrap();

        assert!(matches!(report.outcome, RunOutcome::Filled { market_price: None, .. }));
        assert_eq!(report.message(), "BTC-USD buy order of 14 USD done");
    }

    #[tokio::test]
    async fn test_products_failure_propagates() {
        let exchange = Arc::new(StubExchange::new(vec![btc_usd()]));
        exchange.set_fail_next(true);
        let notifier = Arc::new(RecordingNotifier::new());

        let result = runner(&exchange, &notifier, RejectionPolicy::default())
            .run(&trade(dec!(14), "USD"))
            .await;

        assert!(matches!(result, Err(ExecError::Transport(_))));
        assert!(exchange.placed_orders().is_empty());
    }
}
