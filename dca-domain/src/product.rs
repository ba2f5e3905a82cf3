//! Product catalog entries and market resolution.
//!
//! The exchange publishes one product per tradable pair together with the
//! precision constraints orders on that pair must respect.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::value_objects::{Denomination, DomainError, Increment};

// =============================================================================
// Product
// =============================================================================

/// A tradable pair and its precision constraints.
///
/// Unknown catalog fields (display name, trading flags, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Market pair identifier (e.g., "BTC-USD")
    pub id: String,
    /// Asset being bought or sold (e.g., "BTC")
    pub base_currency: String,
    /// Currency the pair is priced in (e.g., "USD")
    pub quote_currency: String,
    /// Minimum tradable base quantity
    #[serde(deserialize_with = "normalized_decimal")]
    pub base_min_size: Decimal,
    /// Precision step for base quantities
    pub base_increment: Increment,
    /// Precision step for quote amounts and prices
    pub quote_increment: Increment,
}

impl Product {
    /// Work out which side of the pair `currency` refers to.
    ///
    /// Quote is checked first.
    ///
    /// # Errors
    /// Returns `DomainError::CurrencyMismatch` if `currency` is neither the
    /// base nor the quote currency.
    pub fn denomination_of(&self, currency: &str) -> Result<Denomination, DomainError> {
        if currency == self.quote_currency {
            Ok(Denomination::Quote)
        } else if currency == self.base_currency {
            Ok(Denomination::Base)
        } else {
            Err(DomainError::CurrencyMismatch {
                currency: currency.to_string(),
                market: self.id.clone(),
            })
        }
    }

    /// Precision step that applies to amounts of the given denomination.
    pub fn increment_for(&self, denomination: Denomination) -> Increment {
        match denomination {
            Denomination::Base => self.base_increment,
            Denomination::Quote => self.quote_increment,
        }
    }
}

fn normalized_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    <Decimal as Deserialize>::deserialize(deserializer).map(|value| value.normalize())
}

// =============================================================================
// Market Resolution
// =============================================================================

/// A resolved product plus the denomination of the caller's amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSelection {
    /// Catalog entry for the requested pair
    pub product: Product,
    /// Which currency the amount is expressed in
    pub denomination: Denomination,
}

impl MarketSelection {
    /// True when the amount is expressed in the quote currency (order `funds`).
    pub fn is_quote_denominated(&self) -> bool {
        self.denomination == Denomination::Quote
    }

    /// Precision step for the caller's amount.
    pub fn amount_increment(&self) -> Increment {
        self.product.increment_for(self.denomination)
    }
}

/// Find `market` in the catalog and classify `amount_currency` against it.
///
/// Matching on the identifier is exact and case-sensitive.
///
/// # Errors
/// - `DomainError::MarketNotFound` if no product has identifier `market`
/// - `DomainError::CurrencyMismatch` if `amount_currency` is not part of the pair
pub fn resolve_market(
    catalog: &[Product],
    market: &str,
    amount_currency: &str,
) -> Result<MarketSelection, DomainError> {
    let product = catalog
        .iter()
        .find(|p| p.id == market)
        .ok_or_else(|| DomainError::MarketNotFound(market.to_string()))?;

    let denomination = product.denomination_of(amount_currency)?;

    Ok(MarketSelection {
        product: product.clone(),
        denomination,
    })
}

// =============================================================================
// Tests
// =============================================================================
