//! Scaled Amounts
//!
//! Token contracts take integer amounts: the decimal value multiplied by `10^decimals`.
//! `ScaledAmount` holds that integer as a `u128`, e.g. `122.55` with 18 decimals is
//! `122_550_000_000_000_000_000`.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::pricing::Price;

/// Decimal places used by the payment token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Errors converting a decimal value into a scaled amount.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Negative values cannot be transferred.
    #[error("amount is negative")]
    Negative,

    /// The value has more fractional digits than the token supports.
    #[error("amount has {scale} fractional digits, token supports {decimals}")]
    Precision {
        /// Fractional digits in the value
        scale: u32,
        /// Token decimals
        decimals: u32,
    },

    /// The scaled value does not fit in a `u128`.
    #[error("amount overflows the token range")]
    Overflow,
}

/// A token amount in the token's smallest unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScaledAmount(u128);

impl ScaledAmount {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Construct from a raw scaled integer. No scaling applied.
    #[must_use]
    pub const fn from_atomic(raw: u128) -> Self {
        Self(raw)
    }

    /// Construct from whole token units, saturating on overflow.
    #[must_use]
    pub const fn from_units(units: u128, decimals: u32) -> Self {
        match 10_u128.checked_pow(decimals) {
            Some(factor) => Self(units.saturating_mul(factor)),
            None => Self(u128::MAX),
        }
    }

    /// Exact decimal to scaled integer conversion.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if the value is negative, has more fractional digits than
    /// `decimals`, or does not fit in a `u128` once scaled.
    pub fn from_decimal(value: Decimal, decimals: u32) -> Result<Self, AmountError> {
        let value = value.normalize();

        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }

        let scale = value.scale();

        if scale > decimals {
            return Err(AmountError::Precision { scale, decimals });
        }

        let factor = 10_u128
            .checked_pow(decimals - scale)
            .ok_or(AmountError::Overflow)?;

        let mantissa =
            u128::try_from(value.mantissa().abs()).map_err(|_err| AmountError::Overflow)?;

        mantissa
            .checked_mul(factor)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    /// Convert a catalog price into a scaled token amount.
    ///
    /// # Errors
    ///
    /// See [`ScaledAmount::from_decimal`].
    pub fn from_price(price: &Price, decimals: u32) -> Result<Self, AmountError> {
        Self::from_decimal(*price.amount(), decimals)
    }

    /// The raw scaled integer.
    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }

    /// Convert back to a normalized decimal, or `None` if it cannot be represented.
    #[must_use]
    pub fn to_decimal(self, decimals: u32) -> Option<Decimal> {
        let raw = i128::try_from(self.0).ok()?;

        Decimal::try_from_i128_with_scale(raw, decimals)
            .ok()
            .map(|value| value.normalize())
    }

    /// Checked subtraction.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for ScaledAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
