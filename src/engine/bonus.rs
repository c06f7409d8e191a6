use crate::core::currency::Amount;
use crate::error::ExchangeError;
use rust_decimal::Decimal;

/// Strategy mapping the day's profit (base currency) to a manager bonus.
pub trait BonusPolicy: Send + Sync {
    fn calculate_bonus(&self, profit_base: Amount) -> Amount;
}

/// A fixed share of profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentageBonusPolicy {
    percentage: Amount,
}

impl PercentageBonusPolicy {
    /// `percentage` is a fraction: 0.05 pays 5% of profit.
    pub fn new(percentage: Amount) -> Result<Self, ExchangeError> {
        if percentage < Decimal::ZERO {
            return Err(ExchangeError::validation(format!(
                "bonus percentage cannot be negative, got {percentage}"
            )));
        }
        Ok(Self { percentage })
    }

    pub fn percentage(&self) -> Amount {
        self.percentage
    }
}

impl BonusPolicy for PercentageBonusPolicy {
    fn calculate_bonus(&self, profit_base: Amount) -> Amount {
        profit_base.saturating_mul(self.percentage)
    }
}

/// Another policy's bonus, never more than `cap`.
pub struct CappedBonusPolicy {
    inner: Box<dyn BonusPolicy>,
    cap: Amount,
}

impl CappedBonusPolicy {
    pub fn new(inner: Box<dyn BonusPolicy>, cap: Amount) -> Result<Self, ExchangeError> {
        if cap < Decimal::ZERO {
            return Err(ExchangeError::validation(format!(
                "bonus cap cannot be negative, got {cap}"
            )));
        }
        Ok(Self { inner, cap })
    }
}

impl BonusPolicy for CappedBonusPolicy {
    fn calculate_bonus(&self, profit_base: Amount) -> Amount {
        self.inner.calculate_bonus(profit_base).min(self.cap)
    }
}
