use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Monetary amount. Every balance, rate, commission and profit in the
/// office is a decimal.
pub type Amount = Decimal;

/// Currencies the office trades.
///
/// The set is closed. `Local` is the office's home currency and the
/// default base currency used for two-hop conversions and for profit
/// accounting. Variant order is the canonical currency index.
///
/// # Examples
///
/// ```
/// use exchange_office::core::currency::Currency;
///
/// let usd: Currency = "usd".parse().unwrap();
/// assert_eq!(usd, Currency::Usd);
/// assert_eq!(Currency::Local.to_string(), "LOCAL");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Local,
}

impl Currency {
    /// Every currency, in canonical order.
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Eur, Currency::Gbp, Currency::Local];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Local => "LOCAL",
        }
    }

    /// Position of this currency in the canonical ordering.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized currency '{0}' (expected USD, EUR, GBP or LOCAL)")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "LOCAL" => Ok(Currency::Local),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parse_is_case_insensitive() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!(" GBP ".parse::<Currency>().unwrap(), Currency::Gbp);
        assert_eq!("Local".parse::<Currency>().unwrap(), Currency::Local);
    }

    #[test]
    fn test_unknown_currency() {
        let err = "JPY".parse::<Currency>().unwrap_err();
        assert_eq!(err, UnknownCurrency("JPY".to_string()));
    }

    #[test]
    fn test_canonical_ordering() {
        assert!(Currency::Usd < Currency::Eur);
        assert!(Currency::Gbp < Currency::Local);
        assert_eq!(Currency::Local.index(), 3);
        for (i, c) in Currency::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for c in Currency::ALL {
            assert_eq!(c.to_string().parse::<Currency>().unwrap(), c);
        }
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&Currency::Local).unwrap();
        assert_eq!(json, "\"LOCAL\"");
        let back: Currency = serde_json::from_str("\"USD\"").unwrap();
        assert_eq!(back, Currency::Usd);
    }
}
