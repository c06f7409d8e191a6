use crate::core::currency::{Amount, Currency};
use crate::core::rates::{RateError, RateTable};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;

/// Tolerance used when none is configured.
pub const DEFAULT_EPSILON: Amount = Decimal::from_parts(1, 0, 0, false, 8);

/// Errors arising from reserve mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReserveError {
    #[error("reserve amounts cannot be negative, got {amount} {currency}")]
    NegativeAmount { currency: Currency, amount: Amount },
    #[error("insufficient reserve for {currency}: requested {requested}, available {available}")]
    Insufficient {
        currency: Currency,
        requested: Amount,
        available: Amount,
    },
    #[error("depositing {amount} {currency} exceeds the representable balance")]
    Overflow { currency: Currency, amount: Amount },
}

/// Per-currency till balances of the office.
///
/// No operation may leave a balance negative. Withdrawals that overshoot
/// the balance by less than the tolerance are allowed and clamp to zero,
/// which absorbs rounding noise from repeated conversions.
#[derive(Debug, Clone, PartialEq)]
pub struct Reserve {
    /// Currency -> balance. Currencies never touched read as zero.
    balances: BTreeMap<Currency, Amount>,
    epsilon: Amount,
}

impl Default for Reserve {
    fn default() -> Self {
        Self {
            balances: BTreeMap::new(),
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl Reserve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reserve with opening balances. Every balance must be non-negative.
    pub fn with_balances(
        initial: impl IntoIterator<Item = (Currency, Amount)>,
    ) -> Result<Self, ReserveError> {
        let mut reserve = Self::new();
        for (currency, amount) in initial {
            reserve.set_balance(currency, amount)?;
        }
        Ok(reserve)
    }

    /// Replace the withdrawal tolerance.
    pub fn with_epsilon(mut self, epsilon: Amount) -> Self {
        self.epsilon = epsilon.abs();
        self
    }

    pub fn epsilon(&self) -> Amount {
        self.epsilon
    }

    pub fn balance(&self, currency: Currency) -> Amount {
        self.balances.get(&currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn set_balance(&mut self, currency: Currency, amount: Amount) -> Result<(), ReserveError> {
        Self::ensure_non_negative(currency, amount)?;
        self.balances.insert(currency, amount);
        Ok(())
    }

    pub fn deposit(&mut self, currency: Currency, amount: Amount) -> Result<(), ReserveError> {
        Self::ensure_non_negative(currency, amount)?;
        let balance = self
            .balance(currency)
            .checked_add(amount)
            .ok_or(ReserveError::Overflow { currency, amount })?;
        self.balances.insert(currency, balance);
        Ok(())
    }

    /// Take `amount` out of the till. Fails, leaving the balance untouched,
    /// when the till cannot cover it.
    pub fn withdraw(&mut self, currency: Currency, amount: Amount) -> Result<(), ReserveError> {
        Self::ensure_non_negative(currency, amount)?;
        let available = self.balance(currency);
        if !self.can_withdraw(currency, amount) {
            return Err(ReserveError::Insufficient {
                currency,
                requested: amount,
                available,
            });
        }
        self.balances
            .insert(currency, (available - amount).max(Decimal::ZERO));
        Ok(())
    }

    pub fn can_withdraw(&self, currency: Currency, amount: Amount) -> bool {
        amount >= Decimal::ZERO && amount - self.balance(currency) <= self.epsilon
    }

    /// Snapshot of every balance that has been set.
    pub fn all_balances(&self) -> &BTreeMap<Currency, Amount> {
        &self.balances
    }

    /// Value of the whole till expressed in one currency.
    pub fn total_in(&self, currency: Currency, rates: &RateTable) -> Result<Amount, RateError> {
        self.balances
            .iter()
            .try_fold(Decimal::ZERO, |total, (&c, &amount)| {
                let converted = rates.convert(amount, c, currency)?;
                total.checked_add(converted).ok_or(RateError::Overflow {
                    from: c,
                    to: currency,
                    amount,
                })
            })
    }

    fn ensure_non_negative(currency: Currency, amount: Amount) -> Result<(), ReserveError> {
        if amount < Decimal::ZERO {
            return Err(ReserveError::NegativeAmount { currency, amount });
        }
        Ok(())
    }
}
