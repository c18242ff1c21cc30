//! Money value object.
//!
//! Monetary amounts are decimal currency units, never binary floats.
//! The platform fee split must be exact: `total = fee + net` for every
//! booking, under any rounding.

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Platform fee rate applied to every paid booking (5%).
static PLATFORM_FEE_RATE: Lazy<Decimal> = Lazy::new(|| Decimal::new(5, 2));

/// A monetary amount in decimal currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates a Money from a decimal amount.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a Money from major and minor units (e.g. 100 dollars, 50 cents).
    pub fn from_major_minor(major: i64, minor: u32) -> Self {
        Self(Decimal::new(major * 100 + i64::from(minor), 2))
    }

    /// Returns the inner decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Platform fee for this amount, rounded to two decimal places.
    pub fn platform_fee(&self) -> Money {
        Money((self.0 * *PLATFORM_FEE_RATE).round_dp(2))
    }

    /// Amount credited to the business after the platform fee.
    ///
    /// Computed as `self - platform_fee()` so the split always sums
    /// back to the original total.
    pub fn net_of_platform_fee(&self) -> Money {
        *self - self.platform_fee()
    }

    /// True for amounts of zero or less.
    pub fn is_non_positive(&self) -> bool {
        self.0 <= Decimal::ZERO
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
