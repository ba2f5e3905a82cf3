//! Amount normalization.
//!
//! Turns the caller's decimal amount into an exchange-compliant `size` or
//! `funds` value for the resolved market. Minimum order sizes are left to
//! the exchange; its rejection message is surfaced to the caller.

use rust_decimal::Decimal;

use crate::order::OrderQuantity;
use crate::product::MarketSelection;
use crate::value_objects::{Denomination, DomainError};

/// Round `amount` to the precision of the selected market's relevant increment.
///
/// Quote-denominated amounts become `funds` rounded to `quote_increment`;
/// base-denominated amounts become `size` rounded to `base_increment`.
/// Rounding is to nearest, ties away from zero.
///
/// # Errors
/// Returns `DomainError::InvalidAmount` if `amount` is not positive, or if it
/// rounds to zero at the market's precision.
pub fn normalize_amount(
    selection: &MarketSelection,
    amount: Decimal,
) -> Result<OrderQuantity, DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::InvalidAmount(format!("Amount must be positive, got {}", amount)));
    }

    let increment = selection.amount_increment();
    let normalized = increment.quantize(amount);

    if normalized.is_zero() {
        return Err(DomainError::InvalidAmount(format!(
            "{} rounds to zero at increment {}",
            amount, increment
        )));
    }

    Ok(match selection.denomination {
        Denomination::Quote => OrderQuantity::Funds(normalized),
        Denomination::Base => OrderQuantity::Size(normalized),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{resolve_market, Product};
    use crate::value_objects::Increment;
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

    fn select(currency: &str) -> MarketSelection {
        resolve_market(&[btc_usd()], "BTC-USD", currency).unwrap()
    }

    #[test]
    fn test_quote_amount_becomes_funds() {
        let quantity = normalize_amount(&select("USD"), dec!(14)).unwrap();

        assert_eq!(quantity, OrderQuantity::Funds(dec!(14.00)));
        assert_eq!(quantity.as_decimal().to_string(), "14.00");
        assert_eq!(quantity.size(), None);
    }

    #[test]
    fn test_base_amount_becomes_size() {
        let quantity = normalize_amount(&select("BTC"), dec!(0.00125)).unwrap();

        assert_eq!(quantity, OrderQuantity::Size(dec!(0.00125)));
        assert_eq!(quantity.as_decimal().to_string(), "0.00125000");
        assert_eq!(quantity.funds(), None);
    }

    #[test]
    fn test_quote_amount_rounds_half_away_from_zero() {
        let quantity = normalize_amount(&select("USD"), dec!(14.005)).unwrap();
        assert_eq!(quantity.as_decimal(), dec!(14.01));

        let quantity = normalize_amount(&select("USD"), dec!(14.0049)).unwrap();
        assert_eq!(quantity.as_decimal(), dec!(14.00));
    }

    #[test]
    fn test_base_amount_truncated_to_eight_places() {
        let quantity = normalize_amount(&select("BTC"), dec!(0.123456785)).unwrap();
        assert_eq!(quantity.as_decimal(), dec!(0.12345679));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for (currency, amount) in [
            ("USD", dec!(14)),
            ("USD", dec!(9.999)),
            ("USD", dec!(0.005)),
            ("BTC", dec!(0.000000015)),
            ("BTC", dec!(1.5)),
        ] {
            let selection = select(currency);
            let once = normalize_amount(&selection, amount).unwrap().as_decimal();
            let twice = normalize_amount(&selection, once).unwrap().as_decimal();

            assert_eq!(once, twice);
            assert_eq!(once.to_string(), twice.to_string());
        }
    }

    #[test]
    fn test_normalized_precision_bounded_by_increment() {
        let usd = select("USD");
        let btc = select("BTC");

        for amount in [dec!(1), dec!(3.14159), dec!(0.019), dec!(12345.6789)] {
            let funds = normalize_amount(&usd, amount).unwrap().as_decimal();
            assert!(funds.scale() <= 2, "funds {} has scale {}", funds, funds.scale());

            let size = normalize_amount(&btc, amount).unwrap().as_decimal();
            assert!(size.scale() <= 8, "size {} has scale {}", size, size.scale());
        }
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        assert!(matches!(
            normalize_amount(&select("USD"), dec!(0)),
            Err(DomainError::InvalidAmount(_))
        ));
        assert!(matches!(
            normalize_amount(&select("USD"), dec!(-5)),
            Err(DomainError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_rejects_amount_that_rounds_to_zero() {
        assert!(matches!(
            normalize_amount(&select("USD"), dec!(0.004)),
            Err(DomainError::InvalidAmount(_))
        ));
    }
}
