//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places a G Coin amount may carry.
pub const GCOIN_SCALE: u32 = 2;

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in whole G Coins (fractional part in cents).
    pub amount: Decimal,
    /// Unit of account tag.
    pub currency: Currency,
}

/// Units of account supported by the ledger.
///
/// The ledger operates in a single unit; the enum exists so the tag is
/// carried explicitly on every wallet row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// G Coin, the internal unit of account.
    #[default]
    #[serde(rename = "G_COIN")]
    GCoin,
}

impl Currency {
    /// Returns the storage tag for this currency.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GCoin => "G_COIN",
        }
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a G Coin amount.
    #[must_use]
    pub const fn gcoin(amount: Decimal) -> Self {
        Self::new(amount, Currency::GCoin)
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns true if the amount fits the G Coin precision (2 decimal places).
    #[must_use]
    pub fn has_valid_scale(&self) -> bool {
        self.amount.normalize().scale() <= GCOIN_SCALE
    }

    /// Formats the amount at display precision.
    ///
    /// Only used at the outermost boundary; arithmetic stays in `Decimal`.
    #[must_use]
    pub fn display_amount(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(GCOIN_SCALE, RoundingStrategy::MidpointNearestEven);
        format!("{rounded:.2}")
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.display_amount(), self.currency)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "G_COIN" | "GCOIN" => Ok(Self::GCoin),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
