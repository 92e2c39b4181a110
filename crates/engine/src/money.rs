//! Decimal helpers for usage quantities and money.
//!
//! Every amount the engine touches is a [`Decimal`] so sums never drift the
//! way `f64` would. Amounts are persisted as their decimal string and parsed
//! back on read.
//!
//! ```rust
//! use engine::money::cost_of;
//! use rust_decimal::Decimal;
//!
//! let usage = Decimal::new(12, 0);
//! let price = Decimal::new(25, 1);
//! assert_eq!(cost_of(usage, price), Some(Decimal::new(3000, 2)));
//! ```

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use serde_json::Value;

use crate::{EngineError, ResultEngine, ValidationError};

/// Largest magnitude accepted for any amount (10^15).
///
/// Keeps `usage * price` and per-owner sums far away from the `Decimal`
/// overflow bound.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Fraction digits kept on a derived cost.
pub const COST_SCALE: u32 = 2;

/// `round_half_up(usage * unit_price, 2)`, or `None` when the product is out
/// of range.
#[must_use]
pub fn cost_of(usage: Decimal, unit_price: Decimal) -> Option<Decimal> {
    let cost = usage
        .checked_mul(unit_price)?
        .round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero);
    (cost <= MAX_AMOUNT).then_some(cost)
}

/// Reads a JSON value as a non-negative decimal amount.
///
/// Only JSON numbers are accepted; numeric strings are rejected like any
/// other non-number.
pub fn non_negative(field: &'static str, value: &Value) -> Result<Decimal, ValidationError> {
    let invalid = || ValidationError::new(field, format!("{field} must be a non-negative number"));
    let too_large = || ValidationError::new(field, format!("{field} is too large"));

    let Value::Number(number) = value else {
        return Err(invalid());
    };
    let text = number.to_string();
    let amount = match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        Ok(amount) => amount,
        // Beyond 28 fraction digits or 96 bits of mantissa.
        Err(_) => {
            let float = number.as_f64().ok_or_else(invalid)?;
            if float < 0.0 {
                return Err(invalid());
            }
            if float > 1e15 {
                return Err(too_large());
            }
            if float < 1e-28 {
                Decimal::ZERO
            } else {
                Decimal::from_f64(float).ok_or_else(invalid)?
            }
        }
    };

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(invalid());
    }
    if amount > MAX_AMOUNT {
        return Err(too_large());
    }

    // `-0` and `0.0` both land here as zero
    Ok(amount.abs())
}

/// Parses an amount previously written by [`to_stored`].
pub fn from_stored(column: &str, value: &str) -> ResultEngine<Decimal> {
    Decimal::from_str(value)
        .map_err(|_| EngineError::CorruptedRow(format!("{column} is not a decimal: {value}")))
}

/// Canonical text form used for persistence.
#[must_use]
pub fn to_stored(value: Decimal) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn cost_rounds_half_up_to_cents() {
        assert_eq!(
            cost_of(Decimal::new(125, 3), Decimal::ONE),
            Some(Decimal::new(13, 2))
        );
        assert_eq!(
            cost_of(Decimal::new(1005, 3), Decimal::ONE),
            Some(Decimal::new(101, 2))
        );
        assert_eq!(
            cost_of(Decimal::new(3, 0), Decimal::new(3333, 4)),
            Some(Decimal::new(100, 2))
        );
    }

    #[test]
    fn cost_rejects_overflowing_products() {
        assert_eq!(cost_of(MAX_AMOUNT, MAX_AMOUNT), None);
    }

    #[test]
    fn max_amount_is_ten_to_the_fifteenth() {
        assert_eq!(MAX_AMOUNT, Decimal::from(1_000_000_000_000_000i64));
    }

    #[test]
    fn parses_integer_and_fractional_numbers() {
        assert_eq!(non_negative("usage_amount", &json!(12)), Ok(Decimal::new(12, 0)));
        assert_eq!(non_negative("usage_amount", &json!(2.5)), Ok(Decimal::new(25, 1)));
        assert_eq!(non_negative("usage_amount", &json!(0.1)), Ok(Decimal::new(1, 1)));
        assert_eq!(non_negative("usage_amount", &json!(0)), Ok(Decimal::ZERO));
    }

    #[test]
    fn rejects_negative_strings_and_huge_values() {
        let err = non_negative("cost_amount", &json!(-1)).unwrap_err();
        assert_eq!(err.field, "cost_amount");
        assert_eq!(err.message, "cost_amount must be a non-negative number");

        assert!(non_negative("cost_amount", &json!("12")).is_err());
        assert!(non_negative("cost_amount", &json!(null)).is_err());
        assert!(non_negative("cost_amount", &json!(true)).is_err());

        let err = non_negative("cost_amount", &json!(1e20)).unwrap_err();
        assert_eq!(err.message, "cost_amount is too large");

        let err = non_negative("cost_amount", &json!(1.797_693_134_862_315_7e308)).unwrap_err();
        assert_eq!(err.message, "cost_amount is too large");

        let err = non_negative("cost_amount", &json!(-1e-30)).unwrap_err();
        assert_eq!(err.message, "cost_amount must be a non-negative number");
    }

    #[test]
    fn numbers_below_decimal_precision_read_as_zero() {
        assert_eq!(non_negative("usage_amount", &json!(1e-30)), Ok(Decimal::ZERO));
        assert_eq!(non_negative("usage_amount", &json!(5e-324)), Ok(Decimal::ZERO));
        assert_eq!(non_negative("usage_amount", &json!(-0.0)), Ok(Decimal::ZERO));
    }

    #[test]
    fn stored_form_round_trips() {
        let value = Decimal::new(30_125, 3);
        assert_eq!(from_stored("cost_amount", &to_stored(value)).unwrap(), value);
        assert!(from_stored("cost_amount", "abc").is_err());
    }
}
