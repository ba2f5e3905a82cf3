//! Value Objects for the DCA Bot Domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain errors for lookup and validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// No product in the catalog carries the requested identifier
    #[error("Market not found: {0}")]
    MarketNotFound(String),

    /// The amount currency is neither the base nor the quote of the market
    #[error("amount_currency {currency} not in market {market}")]
    CurrencyMismatch {
        /// Currency the caller denominated the amount in
        currency: String,
        /// Market pair that was resolved
        market: String,
    },

    /// Amount must be positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Increment must be positive
    #[error("Invalid increment: {0}")]
    InvalidIncrement(String),

    /// Side must be BUY or SELL
    #[error("Invalid order side: {0}")]
    InvalidSide(String),
}

// =============================================================================
// Increment
// =============================================================================

/// Increment is the smallest precision step the exchange accepts for a field
///
/// # Invariants
/// - Must be > 0
/// - Stored normalized (trailing zeros stripped), so `0.01000000` and `0.01`
///   describe the same precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Increment(Decimal);

impl Increment {
    /// Create a new Increment with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidIncrement` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidIncrement(format!(
                "Increment must be positive, got {}",
                value
            )));
        }
        Ok(Self(value.normalize()))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Number of fractional digits implied by this increment
    pub fn decimal_places(&self) -> u32 {
        self.0.scale()
    }

    /// Round `value` to this increment's fractional digits
    ///
    /// Rounds to nearest with ties away from zero, then pads to exactly
    /// `decimal_places()` digits so the wire representation is stable.
    /// Increments above one round to a whole multiple of the increment.
    ///
    /// # Examples
    /// ```
    /// # use dca_domain::Increment;
    /// # use rust_decimal::Decimal;
    /// let cents = Increment::new(Decimal::new(1, 2)).unwrap();
    /// assert_eq!(cents.quantize(Decimal::new(14, 0)).to_string(), "14.00");
    /// assert_eq!(cents.quantize(Decimal::new(1005, 3)).to_string(), "1.01");
    /// ```
    pub fn quantize(&self, value: Decimal) -> Decimal {
        if self.0 > Decimal::ONE {
            let steps = (value / self.0).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            return (steps * self.0).normalize();
        }

        let places = self.decimal_places();
        let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        // round_dp never increases scale, so this only pads trailing zeros
        rounded.rescale(places);
        rounded
    }
}

impl TryFrom<Decimal> for Increment {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Increment> for Decimal {
    fn from(increment: Increment) -> Self {
        increment.0
    }
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// OrderSide
// =============================================================================

/// OrderSide represents the order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl OrderSide {
    /// Wire representation used by the exchange ("buy" / "sell")
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl FromStr for OrderSide {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            _ => Err(DomainError::InvalidSide(format!("{} (expected BUY or SELL)", s))),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Denomination
// =============================================================================

/// Which side of the pair the caller's amount is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Denomination {
    /// Amount is in base currency units (order `size`)
    Base,
    /// Amount is in quote currency units (order `funds`)
    Quote,
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denomination::Base => write!(f, "base"),
            Denomination::Quote => write!(f, "quote"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
