//! Replays a randomly generated trading day against an office.
//!
//! Used by the demo, the `simulate` command and the benchmarks to push a
//! realistic mix of requests (some of which the till cannot cover) through
//! the engine.

use crate::core::currency::{Amount, Currency};
use crate::core::party::{Party, PersonId};
use crate::core::receipt::Receipt;
use crate::core::request::{ExchangePortion, ExchangeRequest};
use crate::engine::office::ExchangeOffice;
use crate::engine::staff::Cashier;
use crate::error::{ErrorKind, ExchangeError};
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Shape of a generated trading day.
#[derive(Debug, Clone)]
pub struct TradingDayConfig {
    /// Number of distinct clients; ids run from 1.
    pub clients: u32,
    /// Number of requests to generate.
    pub transactions: usize,
    /// Currencies requests are drawn from. At least two.
    pub currencies: Vec<Currency>,
    /// Smallest source amount.
    pub min_amount: Amount,
    /// Largest source amount.
    pub max_amount: Amount,
    /// Chance that a request splits into a fixed portion plus a remainder.
    pub split_probability: f64,
}

impl Default for TradingDayConfig {
    fn default() -> Self {
        Self {
            clients: 10,
            transactions: 50,
            currencies: Currency::ALL.to_vec(),
            min_amount: dec!(10),
            max_amount: dec!(200),
            split_probability: 0.3,
        }
    }
}

impl TradingDayConfig {
    pub fn validate(&self) -> Result<(), ExchangeError> {
        let mut distinct = self.currencies.clone();
        distinct.sort();
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(ExchangeError::validation(
                "a trading day needs at least two currencies",
            ));
        }
        if self.clients == 0 {
            return Err(ExchangeError::validation("a trading day needs clients"));
        }
        if self.min_amount < dec!(0.01) || self.min_amount > self.max_amount {
            return Err(ExchangeError::validation(format!(
                "invalid amount range {}..{}",
                self.min_amount, self.max_amount
            )));
        }
        if !(0.0..=1.0).contains(&self.split_probability) {
            return Err(ExchangeError::validation(format!(
                "split probability must be in [0, 1], got {}",
                self.split_probability
            )));
        }
        Ok(())
    }
}

/// Result of replaying a day.
#[derive(Debug, Clone, Default)]
pub struct DayOutcome {
    pub receipts: Vec<Receipt>,
    /// Rejected requests, counted per error kind.
    pub rejected: BTreeMap<ErrorKind, usize>,
}

impl DayOutcome {
    pub fn accepted(&self) -> usize {
        self.receipts.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Profit of the accepted requests, in the base currency.
    pub fn total_profit(&self) -> Amount {
        self.receipts
            .iter()
            .map(Receipt::profit_base)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

fn to_cents(amount: Amount) -> i64 {
    amount
        .checked_mul(dec!(100))
        .and_then(|cents| cents.trunc().to_i64())
        .unwrap_or(i64::MAX)
}

/// Generate `config.transactions` valid requests.
///
/// Each request has a random client, a random source currency and either a
/// single remainder portion into another currency or, with
/// `split_probability`, a fixed portion into one currency plus the remainder
/// into another. Amounts are whole cents.
pub fn generate_requests(
    config: &TradingDayConfig,
    rng: &mut impl Rng,
) -> Result<Vec<ExchangeRequest>, ExchangeError> {
    config.validate()?;
    let min_cents = to_cents(config.min_amount);
    let max_cents = to_cents(config.max_amount);

    let mut requests = Vec::with_capacity(config.transactions);
    while requests.len() < config.transactions {
        let client_id: PersonId = rng.gen_range(1..=config.clients);
        let client = Party::new(client_id, format!("Client {client_id}"));

        let source = config.currencies[rng.gen_range(0..config.currencies.len())];
        let targets: Vec<Currency> = config
            .currencies
            .iter()
            .copied()
            .filter(|&c| c != source)
            .collect();
        let Some(&target) = targets.choose(rng) else {
            continue;
        };

        let total = Decimal::new(rng.gen_range(min_cents..=max_cents), 2);
        let portions = if total >= dec!(0.02) && rng.gen_bool(config.split_probability) {
            let fixed_cents = rng.gen_range(1..to_cents(total));
            let second = targets.choose(rng).copied().unwrap_or(target);
            vec![
                ExchangePortion::fixed(target, Decimal::new(fixed_cents, 2)),
                ExchangePortion::remainder(second),
            ]
        } else {
            vec![ExchangePortion::remainder(target)]
        };

        requests.push(ExchangeRequest::new(client, source, total, portions)?);
    }
    Ok(requests)
}

/// Push every request through `cashier`, collecting receipts and counting
/// rejections. A rejection never stops the day.
pub fn run_trading_day(
    office: &mut ExchangeOffice,
    cashier: &Cashier,
    requests: impl IntoIterator<Item = ExchangeRequest>,
) -> DayOutcome {
    let mut outcome = DayOutcome::default();
    for request in requests {
        match cashier.handle_request(office, &request) {
            Ok(receipt) => outcome.receipts.push(receipt),
            Err(err) => *outcome.rejected.entry(err.kind()).or_insert(0) += 1,
        }
    }
    info!(
        "trading day replayed: {} accepted, {} rejected, profit {} {}",
        outcome.accepted(),
        outcome.rejected_count(),
        outcome.total_profit(),
        office.rates().base()
    );
    outcome
}
