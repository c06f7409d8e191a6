//! Office configuration, read from a JSON document.
//!
//! Every field is optional; a missing one takes its value from
//! [`OfficeConfig::default`], the reference office:
//!
//! ```json
//! {
//!   "base_currency": "LOCAL",
//!   "commission": "0.03",
//!   "epsilon": "0.00000001",
//!   "bonus_percent": "0.05",
//!   "bonus_cap": null,
//!   "initial_reserve": { "USD": "1000", "EUR": "1000", "GBP": "1000", "LOCAL": "1000" },
//!   "rates": [
//!     { "from": "USD", "to": "LOCAL", "rate": "1.08" },
//!     { "from": "EUR", "to": "LOCAL", "rate": "1.17" },
//!     { "from": "GBP", "to": "LOCAL", "rate": "1.36" }
//!   ],
//!   "critical_minimums": {},
//!   "data_dir": "data"
//! }
//! ```

use crate::core::currency::{Amount, Currency};
use crate::core::rates::{RateEntry, RateTable};
use crate::core::reserve::{Reserve, DEFAULT_EPSILON};
use crate::engine::bonus::{BonusPolicy, CappedBonusPolicy, PercentageBonusPolicy};
use crate::engine::office::{ExchangeOffice, OfficeSettings};
use crate::error::ExchangeError;
use crate::store::{DataStore, StoreError};
use log::info;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ExchangeError),
    #[error("cannot load persisted state: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficeConfig {
    pub base_currency: Currency,
    pub commission: Amount,
    pub epsilon: Amount,
    /// Fraction of the day's profit paid to the manager.
    pub bonus_percent: Amount,
    pub bonus_cap: Option<Amount>,
    pub initial_reserve: BTreeMap<Currency, Amount>,
    pub rates: Vec<RateEntry>,
    pub critical_minimums: BTreeMap<Currency, Amount>,
    pub data_dir: PathBuf,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            base_currency: Currency::Local,
            commission: dec!(0.03),
            epsilon: DEFAULT_EPSILON,
            bonus_percent: dec!(0.05),
            bonus_cap: None,
            initial_reserve: Currency::ALL.iter().map(|&c| (c, dec!(1000))).collect(),
            rates: vec![
                RateEntry {
                    from: Currency::Usd,
                    to: Currency::Local,
                    rate: dec!(1.08),
                },
                RateEntry {
                    from: Currency::Eur,
                    to: Currency::Local,
                    rate: dec!(1.17),
                },
                RateEntry {
                    from: Currency::Gbp,
                    to: Currency::Local,
                    rate: dec!(1.36),
                },
            ],
            critical_minimums: BTreeMap::new(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl OfficeConfig {
    /// Read and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&content)?;
        info!("configuration loaded from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value the office will be built from.
    pub fn validate(&self) -> Result<(), ExchangeError> {
        self.settings()?;
        self.bonus_policy()?;
        self.rate_table(std::iter::empty())?;
        Reserve::with_balances(self.initial_reserve.clone())?;
        if let Some((currency, amount)) = self
            .critical_minimums
            .iter()
            .find(|(_, amount)| **amount < Amount::ZERO)
        {
            return Err(ExchangeError::validation(format!(
                "critical minimum cannot be negative, got {amount} {currency}"
            )));
        }
        Ok(())
    }

    pub fn settings(&self) -> Result<OfficeSettings, ExchangeError> {
        OfficeSettings::new(self.commission, self.epsilon)
    }

    pub fn bonus_policy(&self) -> Result<Box<dyn BonusPolicy>, ExchangeError> {
        let percentage = PercentageBonusPolicy::new(self.bonus_percent)?;
        Ok(match self.bonus_cap {
            Some(cap) => Box::new(CappedBonusPolicy::new(Box::new(percentage), cap)?),
            None => Box::new(percentage),
        })
    }

    /// Configured rates with `overrides` applied on top.
    fn rate_table(
        &self,
        overrides: impl IntoIterator<Item = RateEntry>,
    ) -> Result<RateTable, ExchangeError> {
        Ok(RateTable::from_entries(
            self.base_currency,
            self.rates.iter().copied().chain(overrides),
        )?)
    }

    /// Build an office from this configuration and whatever `store` has
    /// persisted. Persisted balances, rates and thresholds win over the
    /// configured ones.
    pub fn build_office(&self, store: &mut impl DataStore) -> Result<ExchangeOffice, ConfigError> {
        let settings = self.settings()?;
        let rates = self.rate_table(store.load_rates()?)?;

        let balances = store.load_reserve(&self.initial_reserve)?;
        let reserve = Reserve::with_balances(balances).map_err(ExchangeError::from)?;

        let mut minimums = self.critical_minimums.clone();
        minimums.extend(store.load_critical_minimums()?);

        let mut office = ExchangeOffice::new(rates, reserve, settings);
        office.initialize_critical_minimums(minimums)?;
        Ok(office)
    }
}
