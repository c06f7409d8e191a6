use crate::core::currency::{Amount, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors arising from rate table operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("no exchange rate available for {from} -> {to}")]
    RateNotFound { from: Currency, to: Currency },
    #[error("exchange rate must be positive, got {rate} for {from} -> {to}")]
    InvalidRate {
        from: Currency,
        to: Currency,
        rate: Amount,
    },
    #[error("converting {amount} {from} -> {to} exceeds the representable range")]
    Overflow {
        from: Currency,
        to: Currency,
        amount: Amount,
    },
}

/// One undirected rate entry as it is persisted: 1 `from` = `rate` `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    pub from: Currency,
    pub to: Currency,
    #[serde(with = "rust_decimal::serde::str")]
    pub rate: Amount,
}

/// Bidirectional conversion rates with a designated base currency.
///
/// Setting a rate stores both directions (the inverse is `1 / rate`).
/// Pairs that are not configured directly can still be converted when
/// both legs through the base currency exist.
///
/// # Examples
///
/// ```
/// use exchange_office::core::currency::Currency;
/// use exchange_office::core::rates::RateTable;
/// use rust_decimal_macros::dec;
///
/// let mut rates = RateTable::new(Currency::Local);
/// rates.set_rate(Currency::Usd, Currency::Local, dec!(1.08)).unwrap();
/// rates.set_rate(Currency::Eur, Currency::Local, dec!(1.25)).unwrap();
///
/// // USD -> EUR has no direct rate and goes through LOCAL.
/// let eur = rates.convert(dec!(100), Currency::Usd, Currency::Eur).unwrap();
/// assert_eq!(eur, dec!(86.4));
/// ```
#[derive(Debug, Clone)]
pub struct RateTable {
    base: Currency,
    /// Direct rates: (from, to) -> rate. Always holds both directions.
    rates: BTreeMap<(Currency, Currency), Amount>,
}

impl RateTable {
    pub fn new(base: Currency) -> Self {
        Self {
            base,
            rates: BTreeMap::new(),
        }
    }

    /// Build a table from persisted entries, validating each one.
    pub fn from_entries(
        base: Currency,
        entries: impl IntoIterator<Item = RateEntry>,
    ) -> Result<Self, RateError> {
        let mut table = Self::new(base);
        for entry in entries {
            table.set_rate(entry.from, entry.to, entry.rate)?;
        }
        Ok(table)
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    /// Set a direct exchange rate: 1 unit of `from` = `rate` units of `to`.
    /// The inverse direction is stored as well.
    pub fn set_rate(&mut self, from: Currency, to: Currency, rate: Amount) -> Result<(), RateError> {
        if rate <= Decimal::ZERO {
            return Err(RateError::InvalidRate { from, to, rate });
        }
        if from == to {
            // Identity is implicit; a stored rate could only contradict it.
            return if rate == Decimal::ONE {
                Ok(())
            } else {
                Err(RateError::InvalidRate { from, to, rate })
            };
        }
        self.rates.insert((from, to), rate);
        self.rates.insert((to, from), Decimal::ONE / rate);
        Ok(())
    }

    /// The direct rate from one currency to another. No base hop.
    pub fn get_rate(&self, from: Currency, to: Currency) -> Result<Amount, RateError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(&(from, to))
            .copied()
            .ok_or(RateError::RateNotFound { from, to })
    }

    /// Whether `convert` would succeed, directly or through the base currency.
    pub fn can_convert(&self, from: Currency, to: Currency) -> bool {
        from == to || self.rates.contains_key(&(from, to)) || self.via_base(from, to).is_some()
    }

    fn via_base(&self, from: Currency, to: Currency) -> Option<(Amount, Amount)> {
        let to_base = self.rates.get(&(from, self.base))?;
        let from_base = self.rates.get(&(self.base, to))?;
        Some((*to_base, *from_base))
    }

    /// Convert an amount, using the direct rate when configured and the
    /// base currency as an intermediate hop otherwise.
    pub fn convert(&self, amount: Amount, from: Currency, to: Currency) -> Result<Amount, RateError> {
        if from == to {
            return Ok(amount);
        }
        let overflow = RateError::Overflow { from, to, amount };
        if let Some(rate) = self.rates.get(&(from, to)) {
            return amount.checked_mul(*rate).ok_or(overflow);
        }
        match self.via_base(from, to) {
            Some((to_base, from_base)) => amount
                .checked_mul(to_base)
                .and_then(|in_base| in_base.checked_mul(from_base))
                .ok_or(overflow),
            None => Err(RateError::RateNotFound { from, to }),
        }
    }

    /// Each undirected pair exactly once, ordered by currency index with the
    /// lower-indexed currency first.
    pub fn entries(&self) -> Vec<RateEntry> {
        self.rates
            .iter()
            .filter(|((from, to), _)| from.index() < to.index())
            .map(|(&(from, to), &rate)| RateEntry { from, to, rate })
            .collect()
    }

    /// Number of undirected pairs configured.
    pub fn len(&self) -> usize {
        self.rates.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table() -> RateTable {
        let mut table = RateTable::new(Currency::Local);
        table.set_rate(Currency::Usd, Currency::Local, dec!(1.08)).unwrap();
        table.set_rate(Currency::Eur, Currency::Local, dec!(1.25)).unwrap();
        table
    }

    #[test]
    fn test_rate_table_direct() {
        let rate = table().get_rate(Currency::Usd, Currency::Local).unwrap();
        assert_eq!(rate, dec!(1.08));
    }

    #[test]
    fn test_rate_table_inverse() {
        let mut table = RateTable::new(Currency::Local);
        table.set_rate(Currency::Gbp, Currency::Local, dec!(0.20)).unwrap();
        let rate = table.get_rate(Currency::Local, Currency::Gbp).unwrap();
        assert_eq!(rate, dec!(5)); // 1 / 0.20
    }

    #[test]
    fn test_same_currency_rate() {
        let table = RateTable::new(Currency::Local);
        for c in Currency::ALL {
            assert_eq!(table.get_rate(c, c).unwrap(), Decimal::ONE);
            assert!(table.can_convert(c, c));
        }
    }

    #[test]
    fn test_invalid_rate() {
        let mut table = RateTable::new(Currency::Local);
        let err = table
            .set_rate(Currency::Usd, Currency::Local, dec!(-0.5))
            .unwrap_err();
        assert!(matches!(err, RateError::InvalidRate { .. }));
        assert!(table.set_rate(Currency::Usd, Currency::Local, Decimal::ZERO).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_get_rate_does_not_hop() {
        let err = table().get_rate(Currency::Usd, Currency::Eur).unwrap_err();
        assert_eq!(
            err,
            RateError::RateNotFound {
                from: Currency::Usd,
                to: Currency::Eur
            }
        );
    }

    #[test]
    fn test_convert_via_base() {
        let table = table();
        assert!(table.can_convert(Currency::Usd, Currency::Eur));
        // 100 USD -> 108 LOCAL -> 86.4 EUR
        let eur = table.convert(dec!(100), Currency::Usd, Currency::Eur).unwrap();
        assert_eq!(eur, dec!(86.4));
    }

    #[test]
    fn test_convert_prefers_direct_rate() {
        let mut table = table();
        table.set_rate(Currency::Usd, Currency::Eur, dec!(0.95)).unwrap();
        let eur = table.convert(dec!(100), Currency::Usd, Currency::Eur).unwrap();
        assert_eq!(eur, dec!(95));
    }

    #[test]
    fn test_no_path() {
        let table = table();
        assert!(!table.can_convert(Currency::Usd, Currency::Gbp));
        let err = table
            .convert(dec!(10), Currency::Usd, Currency::Gbp)
            .unwrap_err();
        assert!(matches!(err, RateError::RateNotFound { .. }));
    }

    #[test]
    fn test_convert_overflow_is_an_error() {
        let table = table();
        let err = table
            .convert(Decimal::MAX, Currency::Usd, Currency::Local)
            .unwrap_err();
        assert!(matches!(err, RateError::Overflow { .. }));
        let err = table
            .convert(Decimal::MAX, Currency::Usd, Currency::Eur)
            .unwrap_err();
        assert!(matches!(err, RateError::Overflow { .. }));
    }

    #[test]
    fn test_entries_lists_each_pair_once() {
        let mut table = RateTable::new(Currency::Local);
        table.set_rate(Currency::Local, Currency::Usd, dec!(0.5)).unwrap();
        table.set_rate(Currency::Eur, Currency::Gbp, dec!(0.8)).unwrap();

        let entries = table.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(
            entries[0],
            RateEntry {
                from: Currency::Usd,
                to: Currency::Local,
                rate: dec!(2)
            }
        );
        assert_eq!(entries[1].from, Currency::Eur);
        assert_eq!(entries[1].to, Currency::Gbp);
    }

    #[test]
    fn test_from_entries_round_trip() {
        let original = table();
        let rebuilt = RateTable::from_entries(Currency::Local, original.entries()).unwrap();
        assert_eq!(
            rebuilt.get_rate(Currency::Usd, Currency::Local).unwrap(),
            dec!(1.08)
        );
        assert_eq!(rebuilt.len(), original.len());
    }

    #[test]
    fn test_identity_rate_rejects_non_unit() {
        let mut table = RateTable::new(Currency::Local);
        assert!(table.set_rate(Currency::Usd, Currency::Usd, Decimal::ONE).is_ok());
        assert!(table.set_rate(Currency::Usd, Currency::Usd, dec!(2)).is_err());
        assert!(table.is_empty());
    }
}
