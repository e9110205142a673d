//! Pricing

use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Money value in a catalog currency.
pub type Price = Money<'static, Currency>;

/// Errors that can occur while calculating totals.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// The total does not fit in minor units.
    #[error("price overflow")]
    Overflow,
}

/// Price of `quantity` units at `price` each.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the result does not fit in minor units.
pub fn line_total(price: &Price, quantity: u32) -> Result<Price, PricingError> {
    let minor = price
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, price.currency()))
}

/// Sums prices, starting from zero in `currency`.
///
/// # Errors
///
/// - [`PricingError::Money`]: a price is in a different currency.
pub fn sum<I>(prices: I, currency: &'static Currency) -> Result<Price, PricingError>
where
    I: IntoIterator<Item = Price>,
{
    let total = prices
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, price| acc.add(price))?;

    Ok(total)
}

/// The decimal amount of a price, e.g. `120.05`.
pub fn amount(price: &Price) -> Decimal {
    *price.amount()
}
