//! Non-negative decimal amounts with two-digit precision
//!
//! Hours worked, hourly rates and claim totals are all stored as
//! `decimal(18, 2)`. `Amount` enforces the scale and the sign once, at the
//! boundary, so the rest of the system can rely on both.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of decimal places kept for every amount
pub const AMOUNT_SCALE: u32 = 2;

/// Errors that can occur when constructing an amount
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount must not be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative decimal rounded to two places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Creates an amount, rounding half away from zero to two places
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        let rounded = value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            return Err(AmountError::Negative(value));
        }
        // -0.00 normalises to 0.00
        Ok(Self(rounded.abs()))
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Decimal {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
