//! Amount guard clauses and wallet provisioning policy.

use std::time::Duration;

use gcoin_shared::LedgerConfig;
use gcoin_shared::types::Money;
use rust_decimal::Decimal;

use crate::ledger::error::{LedgerError, LedgerResult};

/// Policy applied by the Wallet Manager and Transfer Engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Balance seeded into every new wallet; zero seeds nothing.
    pub welcome_bonus: Decimal,
    /// Upper bound for a single credit, debit, transfer, or request.
    pub max_amount: Decimal,
    /// Smallest accepted deposit.
    pub deposit_min: Decimal,
    /// Largest accepted deposit.
    pub deposit_max: Decimal,
    /// Row-lock wait bound for stores that honour it.
    pub lock_timeout: Duration,
    /// Bound on each counterparty-name lookup.
    pub identity_timeout: Duration,
    /// Rows included with the wallet summary.
    pub recent_transactions: u64,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerPolicy {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            welcome_bonus: config.welcome_bonus,
            max_amount: config.max_amount,
            deposit_min: config.deposit_min,
            deposit_max: config.deposit_max,
            lock_timeout: Duration::from_millis(config.lock_timeout_ms),
            identity_timeout: Duration::from_millis(config.identity_timeout_ms),
            recent_transactions: config.recent_transactions,
        }
    }
}

impl LedgerPolicy {
    /// Validates an amount for credit, debit, transfer, withdrawal, or request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the amount is not positive, carries more
    /// than two decimal places, or exceeds `max_amount`.
    pub fn validate_amount(&self, amount: Decimal) -> LedgerResult<()> {
        check_positive_scaled(amount)?;
        if amount > self.max_amount {
            return Err(LedgerError::InvalidAmount(format!(
                "Amount exceeds maximum of {}",
                self.max_amount
            )));
        }
        Ok(())
    }

    /// Validates an amount arriving from a payment rail.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` outside `deposit_min..=deposit_max`.
    pub fn validate_deposit(&self, amount: Decimal) -> LedgerResult<()> {
        check_positive_scaled(amount)?;
        if amount < self.deposit_min {
            return Err(LedgerError::InvalidAmount(format!(
                "Minimum deposit amount is {}",
                self.deposit_min
            )));
        }
        if amount > self.deposit_max {
            return Err(LedgerError::InvalidAmount(format!(
                "Maximum deposit amount is {}",
                self.deposit_max
            )));
        }
        Ok(())
    }
}

fn check_positive_scaled(amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(
            "Amount must be greater than 0".to_string(),
        ));
    }
    if !Money::gcoin(amount).has_valid_scale() {
        return Err(LedgerError::InvalidAmount(
            "Amount supports at most 2 decimal places".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0.01))]
    #[case(dec!(1))]
    #[case(dec!(10000))]
    #[case(dec!(12.50))]
    #[case(dec!(12.500))]
    fn test_valid_amounts(#[case] amount: Decimal) {
        assert!(LedgerPolicy::default().validate_amount(amount).is_ok());
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-5))]
    #[case(dec!(0.001))]
    #[case(dec!(10000.01))]
    fn test_invalid_amounts(#[case] amount: Decimal) {
        assert!(matches!(
            LedgerPolicy::default().validate_amount(amount),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_deposit_bounds() {
        let policy = LedgerPolicy::default();
        assert!(policy.validate_deposit(dec!(1)).is_ok());
        assert!(policy.validate_deposit(dec!(10000)).is_ok());

        let err = policy.validate_deposit(dec!(0.5)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid amount: Minimum deposit amount is 1");

        let err = policy.validate_deposit(dec!(10001)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid amount: Maximum deposit amount is 10000");
    }

    #[test]
    fn test_policy_from_config() {
        let config = LedgerConfig {
            welcome_bonus: dec!(0),
            lock_timeout_ms: 250,
            identity_timeout_ms: 40,
            ..LedgerConfig::default()
        };
        let policy = LedgerPolicy::from(&config);
        assert_eq!(policy.welcome_bonus, Decimal::ZERO);
        assert_eq!(policy.lock_timeout, Duration::from_millis(250));
        assert_eq!(policy.identity_timeout, Duration::from_millis(40));
    }
}
