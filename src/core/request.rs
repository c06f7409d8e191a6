use crate::core::currency::{Amount, Currency};
use crate::core::party::Party;
use crate::error::ExchangeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How much of the request's source amount a portion consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortionAmount {
    /// A fixed amount in the source currency.
    Fixed(Amount),
    /// Whatever the other portions leave unallocated.
    Remainder,
}

/// One requested slice of a conversion.
///
/// Preferred denominations are advisory and are copied onto the receipt
/// untouched; they are not checked against cash on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangePortion {
    target: Currency,
    amount: PortionAmount,
    #[serde(default)]
    denominations: Vec<u32>,
}

impl ExchangePortion {
    /// Convert a fixed amount of the source currency into `target`.
    pub fn fixed(target: Currency, source_amount: Amount) -> Self {
        Self {
            target,
            amount: PortionAmount::Fixed(source_amount),
            denominations: Vec::new(),
        }
    }

    /// Convert whatever remains of the source amount into `target`.
    pub fn remainder(target: Currency) -> Self {
        Self {
            target,
            amount: PortionAmount::Remainder,
            denominations: Vec::new(),
        }
    }

    /// Attach preferred payout denominations, in order of preference.
    pub fn with_denominations(mut self, denominations: impl Into<Vec<u32>>) -> Self {
        self.denominations = denominations.into();
        self
    }

    pub fn target(&self) -> Currency {
        self.target
    }

    pub fn amount(&self) -> PortionAmount {
        self.amount
    }

    pub fn is_remainder(&self) -> bool {
        matches!(self.amount, PortionAmount::Remainder)
    }

    pub fn fixed_amount(&self) -> Option<Amount> {
        match self.amount {
            PortionAmount::Fixed(amount) => Some(amount),
            PortionAmount::Remainder => None,
        }
    }

    pub fn denominations(&self) -> &[u32] {
        &self.denominations
    }
}

/// A client's request to exchange money.
///
/// Requests are immutable once built and are validated on construction:
/// the total must be positive, fixed portions non-negative, there must be
/// at least one portion and at most one remainder portion. Whether the
/// fixed portions fit inside the total is checked by the office, with its
/// configured tolerance.
///
/// # Examples
///
/// ```
/// use exchange_office::core::currency::Currency;
/// use exchange_office::core::party::Party;
/// use exchange_office::core::request::{ExchangePortion, ExchangeRequest};
/// use rust_decimal_macros::dec;
///
/// let request = ExchangeRequest::new(
///     Party::new(1, "Ada"),
///     Currency::Usd,
///     dec!(100),
///     vec![
///         ExchangePortion::fixed(Currency::Eur, dec!(40)),
///         ExchangePortion::remainder(Currency::Local),
///     ],
/// )
/// .unwrap();
///
/// assert_eq!(request.allocated_fixed(), dec!(40));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeRequest {
    client: Party,
    source_currency: Currency,
    total_amount: Amount,
    portions: Vec<ExchangePortion>,
}

impl ExchangeRequest {
    pub fn new(
        client: Party,
        source_currency: Currency,
        total_amount: Amount,
        portions: Vec<ExchangePortion>,
    ) -> Result<Self, ExchangeError> {
        if total_amount <= Decimal::ZERO {
            return Err(ExchangeError::validation(format!(
                "amount must be greater than zero, got {total_amount}"
            )));
        }
        if portions.is_empty() {
            return Err(ExchangeError::validation(
                "request must contain at least one portion",
            ));
        }
        if portions.iter().filter(|p| p.is_remainder()).count() > 1 {
            return Err(ExchangeError::validation(
                "at most one portion may take the remainder",
            ));
        }
        if let Some(negative) = portions
            .iter()
            .filter_map(ExchangePortion::fixed_amount)
            .find(|amount| *amount < Decimal::ZERO)
        {
            return Err(ExchangeError::validation(format!(
                "portion amount cannot be negative, got {negative}"
            )));
        }
        portions
            .iter()
            .filter_map(ExchangePortion::fixed_amount)
            .try_fold(Decimal::ZERO, |sum, amount| sum.checked_add(amount))
            .ok_or_else(|| ExchangeError::validation("portion amounts are too large"))?;
        Ok(Self {
            client,
            source_currency,
            total_amount,
            portions,
        })
    }

    /// A request converting the whole amount into one currency.
    pub fn simple(
        client: Party,
        source_currency: Currency,
        total_amount: Amount,
        target: Currency,
    ) -> Result<Self, ExchangeError> {
        Self::new(
            client,
            source_currency,
            total_amount,
            vec![ExchangePortion::remainder(target)],
        )
    }

    /// Sum of the fixed portions, in the source currency.
    pub fn allocated_fixed(&self) -> Amount {
        self.portions
            .iter()
            .filter_map(ExchangePortion::fixed_amount)
            .fold(Decimal::ZERO, |sum, amount| sum.saturating_add(amount))
    }

    // --- Accessors ---

    pub fn client(&self) -> &Party {
        &self.client
    }

    pub fn source_currency(&self) -> Currency {
        self.source_currency
    }

    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    pub fn portions(&self) -> &[ExchangePortion] {
        &self.portions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    fn client() -> Party {
        Party::new(1, "Ada")
    }

    #[test]
    fn test_request_creation() {
        let request = ExchangeRequest::new(
            client(),
            Currency::Usd,
            dec!(100),
            vec![
                ExchangePortion::fixed(Currency::Eur, dec!(30)).with_denominations(vec![20, 10]),
                ExchangePortion::fixed(Currency::Gbp, dec!(20)),
                ExchangePortion::remainder(Currency::Local),
            ],
        )
        .unwrap();

        assert_eq!(request.source_currency(), Currency::Usd);
        assert_eq!(request.total_amount(), dec!(100));
        assert_eq!(request.allocated_fixed(), dec!(50));
        assert_eq!(request.portions()[0].denominations(), &[20, 10]);
        assert!(request.portions()[2].is_remainder());
    }

    #[test]
    fn test_two_remainders_rejected() {
        let err = ExchangeRequest::new(
            client(),
            Currency::Usd,
            dec!(100),
            vec![
                ExchangePortion::remainder(Currency::Eur),
                ExchangePortion::remainder(Currency::Local),
            ],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_non_positive_total_rejected() {
        for total in [Decimal::ZERO, dec!(-10)] {
            let err = ExchangeRequest::simple(client(), Currency::Usd, total, Currency::Local)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_negative_portion_rejected() {
        let err = ExchangeRequest::new(
            client(),
            Currency::Usd,
            dec!(100),
            vec![ExchangePortion::fixed(Currency::Eur, dec!(-5))],
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot be negative"));
    }

    #[test]
    fn test_fixed_portions_beyond_decimal_range_rejected() {
        let err = ExchangeRequest::new(
            client(),
            Currency::Usd,
            dec!(100),
            vec![
                ExchangePortion::fixed(Currency::Eur, Decimal::MAX),
                ExchangePortion::fixed(Currency::Gbp, Decimal::MAX),
            ],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_empty_portions_rejected() {
        let err = ExchangeRequest::new(client(), Currency::Usd, dec!(100), vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_over_allocation_is_left_to_the_office() {
        // Fitting fixed portions into the total needs the office's tolerance.
        let request = ExchangeRequest::new(
            client(),
            Currency::Usd,
            dec!(100),
            vec![ExchangePortion::fixed(Currency::Eur, dec!(150))],
        )
        .unwrap();
        assert_eq!(request.allocated_fixed(), dec!(150));
    }
}
