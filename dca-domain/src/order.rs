//! Order request and order snapshot types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::normalize_amount;
use crate::product::MarketSelection;
use crate::value_objects::{DomainError, Increment, OrderSide};

// =============================================================================
// Order Request
// =============================================================================

/// Normalized order quantity.
///
/// A market order carries exactly one of `size` or `funds`; the enum makes
/// the other one unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderQuantity {
    /// Base currency units
    Size(Decimal),
    /// Quote currency units
    Funds(Decimal),
}

impl OrderQuantity {
    /// The normalized value, whichever field it belongs to
    pub fn as_decimal(&self) -> Decimal {
        match self {
            OrderQuantity::Size(value) | OrderQuantity::Funds(value) => *value,
        }
    }

    /// `Some` if this is a base-denominated size
    pub fn size(&self) -> Option<Decimal> {
        match self {
            OrderQuantity::Size(value) => Some(*value),
            OrderQuantity::Funds(_) => None,
        }
    }

    /// `Some` if this is a quote-denominated funds value
    pub fn funds(&self) -> Option<Decimal> {
        match self {
            OrderQuantity::Funds(value) => Some(*value),
            OrderQuantity::Size(_) => None,
        }
    }

    /// Exchange field name carrying the value ("size" or "funds")
    pub fn field_name(&self) -> &'static str {
        match self {
            OrderQuantity::Size(_) => "size",
            OrderQuantity::Funds(_) => "funds",
        }
    }
}

/// A market order ready to be sent to the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Market pair (e.g., "BTC-USD")
    pub product_id: String,
    /// Buy or sell
    pub side: OrderSide,
    /// Normalized size or funds
    pub quantity: OrderQuantity,
}

impl OrderRequest {
    /// Build a market order for the resolved market, normalizing `amount`.
    ///
    /// # Errors
    /// Propagates `DomainError::InvalidAmount` from normalization.
    pub fn market(
        selection: &MarketSelection,
        side: OrderSide,
        amount: Decimal,
    ) -> Result<Self, DomainError> {
        let quantity = normalize_amount(selection, amount)?;
        Ok(Self {
            product_id: selection.product.id.clone(),
            side,
            quantity,
        })
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Order status as reported by the exchange.
///
/// Statuses the bot does not branch on are kept verbatim in `Other` so they
/// can still be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// Accepted, not yet on the book
    Pending,
    /// On the book, working
    Open,
    /// Finished (filled or cancelled by the matching engine)
    Done,
    /// Refused by the exchange
    Rejected,
    /// Any other exchange status
    Other(String),
}

impl OrderStatus {
    /// True while the exchange is still working the order
    pub fn is_working(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Open)
    }

    /// Status string as the exchange spells it
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Open => "open",
            OrderStatus::Done => "done",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Other(status) => status,
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Other("unknown".to_string())
    }
}

impl From<String> for OrderStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "pending" => OrderStatus::Pending,
            "open" => OrderStatus::Open,
            "done" => OrderStatus::Done,
            "rejected" => OrderStatus::Rejected,
            _ => OrderStatus::Other(status),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Snapshot
// =============================================================================

/// Snapshot of an order as last reported by the exchange.
///
/// Each poll replaces the previous snapshot wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Exchange-assigned order ID (empty if the exchange returned none)
    #[serde(default)]
    pub id: String,
    /// Market pair
    #[serde(default)]
    pub product_id: Option<String>,
    /// Current status
    #[serde(default)]
    pub status: OrderStatus,
    /// Total quote value executed so far
    #[serde(default)]
    pub executed_value: Option<Decimal>,
    /// Total base quantity filled so far
    #[serde(default)]
    pub filled_size: Option<Decimal>,
    /// Exchange reason for a rejection, when given
    #[serde(default)]
    pub reject_reason: Option<String>,
}

impl Order {
    /// Whether the exchange returned an identifier that can be polled
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Average execution price rounded to `quote_increment`.
    ///
    /// `None` when nothing has been filled yet (no price to report).
    pub fn average_price(&self, quote_increment: Increment) -> Option<Decimal> {
        let executed_value = self.executed_value?;
        let filled_size = self.filled_size?;
        executed_value
            .checked_div(filled_size)
            .map(|price| quote_increment.quantize(price))
    }
}

// =============================================================================
// Tests
// =============================================================================
