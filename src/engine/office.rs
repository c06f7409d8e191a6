use crate::core::currency::{Amount, Currency};
use crate::core::party::Party;
use crate::core::rates::RateTable;
use crate::core::receipt::{PayoutDetail, Receipt, ReceiptId, TransactionRecord};
use crate::core::request::{ExchangeRequest, PortionAmount};
use crate::core::reserve::{Reserve, DEFAULT_EPSILON};
use crate::engine::report::DailyReport;
use crate::error::ExchangeError;
use chrono::Utc;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Office-wide constants fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeSettings {
    /// Fraction of every converted amount kept by the office, in [0, 1).
    commission: Amount,
    /// Tolerance for comparisons on amounts that went through conversions.
    epsilon: Amount,
}

impl OfficeSettings {
    pub fn new(commission: Amount, epsilon: Amount) -> Result<Self, ExchangeError> {
        if commission < Decimal::ZERO || commission >= Decimal::ONE {
            return Err(ExchangeError::validation(format!(
                "commission must be in [0, 1), got {commission}"
            )));
        }
        if epsilon < Decimal::ZERO {
            return Err(ExchangeError::validation(format!(
                "epsilon cannot be negative, got {epsilon}"
            )));
        }
        Ok(Self {
            commission,
            epsilon,
        })
    }

    /// Settings with the given commission and the default tolerance.
    pub fn with_commission(commission: Amount) -> Result<Self, ExchangeError> {
        Self::new(commission, DEFAULT_EPSILON)
    }

    pub fn commission(&self) -> Amount {
        self.commission
    }

    pub fn epsilon(&self) -> Amount {
        self.epsilon
    }
}

/// The effect a request would have, computed without touching the office.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub source_currency: Currency,
    /// Source amount the portions consume.
    pub source_consumed: Amount,
    /// Source amount handed back to the client untouched.
    pub returned_to_client: Amount,
    pub payouts: Vec<PayoutDetail>,
    pub profit_base: Amount,
    pub commission_base: Amount,
}

/// The transaction and ledger engine of an exchange office.
///
/// Owns the rate table, the current reserve, the reserve snapshot taken at
/// the start of the trading day, critical-minimum thresholds, and the day's
/// transaction history and profit.
///
/// Every mutating operation either commits fully or fails leaving the office
/// untouched. Transactions are settled against a working copy of the reserve
/// that replaces the live one only once every portion has succeeded.
///
/// # Examples
///
/// ```
/// use exchange_office::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let mut rates = RateTable::new(Currency::Local);
/// rates.set_rate(Currency::Usd, Currency::Local, dec!(1.08)).unwrap();
/// let reserve = Reserve::with_balances([
///     (Currency::Usd, dec!(1000)),
///     (Currency::Local, dec!(1000)),
/// ])
/// .unwrap();
/// let settings = OfficeSettings::with_commission(dec!(0.03)).unwrap();
/// let mut office = ExchangeOffice::new(rates, reserve, settings);
///
/// let request = ExchangeRequest::simple(
///     Party::new(2, "Dave"), Currency::Usd, dec!(100), Currency::Local,
/// )
/// .unwrap();
/// let receipt = office
///     .execute_transaction(&request, &Party::new(1, "Carol"))
///     .unwrap();
///
/// assert_eq!(receipt.payouts()[0].amount_paid, dec!(104.76));
/// assert_eq!(office.reserve().balance(Currency::Local), dec!(895.24));
/// ```
#[derive(Debug, Clone)]
pub struct ExchangeOffice {
    rates: RateTable,
    reserve: Reserve,
    starting_reserve: Reserve,
    critical_minimums: BTreeMap<Currency, Amount>,
    history: Vec<TransactionRecord>,
    profit_base: Amount,
    settings: OfficeSettings,
    next_receipt_id: ReceiptId,
}

/// A fully settled request: the quote plus the reserve it would leave behind.
struct Settlement {
    quote: Quote,
    reserve: Reserve,
}

impl ExchangeOffice {
    pub fn new(rates: RateTable, reserve: Reserve, settings: OfficeSettings) -> Self {
        let reserve = reserve.with_epsilon(settings.epsilon);
        Self {
            rates,
            starting_reserve: reserve.clone(),
            reserve,
            critical_minimums: BTreeMap::new(),
            history: Vec::new(),
            profit_base: Decimal::ZERO,
            settings,
            next_receipt_id: 1,
        }
    }

    /// Execute an exchange on behalf of `cashier`.
    ///
    /// # Algorithm
    ///
    /// 1. Reject requests whose fixed portions exceed the total.
    /// 2. Walk the portions in order; each consumes its fixed amount or, for
    ///    the remainder portion, whatever is still unallocated.
    /// 3. Convert each slice, withhold the commission, withdraw the full
    ///    converted amount from the till, put the commission back and take
    ///    the client's source cash in.
    /// 4. Unconsumed source money goes back to the client with no reserve
    ///    effect.
    /// 5. Commit the new reserve, record the transaction and its profit.
    pub fn execute_transaction(
        &mut self,
        request: &ExchangeRequest,
        cashier: &Party,
    ) -> Result<Receipt, ExchangeError> {
        let Settlement { quote, reserve } = self.settle(request).map_err(|err| {
            debug!(
                "rejected {} {} for client {}: {}",
                request.total_amount(),
                request.source_currency(),
                request.client(),
                err
            );
            err
        })?;
        let profit_base = self
            .profit_base
            .checked_add(quote.profit_base)
            .ok_or_else(|| {
                ExchangeError::validation("daily profit exceeds the representable range")
            })?;

        self.reserve = reserve;
        self.profit_base = profit_base;
        let id = self.next_receipt_id;
        self.next_receipt_id += 1;

        let receipt = Receipt::new(
            id,
            cashier.clone(),
            request.client().clone(),
            quote.source_currency,
            quote.source_consumed,
            quote.payouts,
            quote.profit_base,
            quote.commission_base,
            Utc::now(),
        );
        self.history.push(TransactionRecord::from(&receipt));

        info!(
            "receipt #{}: {} {} exchanged by {} for {}, profit {} {}",
            id,
            receipt.source_amount(),
            receipt.source_currency(),
            cashier,
            receipt.client(),
            receipt.profit_base(),
            self.rates.base()
        );
        for payout in receipt.payouts() {
            self.warn_if_below_critical(payout.currency);
        }
        Ok(receipt)
    }

    /// What `execute_transaction` would produce for `request`, without
    /// committing anything or consuming a receipt id.
    pub fn quote(&self, request: &ExchangeRequest) -> Result<Quote, ExchangeError> {
        self.settle(request).map(|settlement| settlement.quote)
    }

    fn settle(&self, request: &ExchangeRequest) -> Result<Settlement, ExchangeError> {
        let epsilon = self.settings.epsilon;
        let source = request.source_currency();
        let base = self.rates.base();

        if request.allocated_fixed() - request.total_amount() > epsilon {
            return Err(ExchangeError::validation(format!(
                "requested allocation {} exceeds available amount {}",
                request.allocated_fixed(),
                request.total_amount()
            )));
        }

        let mut reserve = self.reserve.clone();
        let mut remaining = request.total_amount();
        let mut payouts = Vec::with_capacity(request.portions().len());
        let mut profit_base = Decimal::ZERO;

        for portion in request.portions() {
            let target = portion.target();
            let slice = match portion.amount() {
                PortionAmount::Remainder => remaining,
                PortionAmount::Fixed(amount) => amount,
            };
            if slice < Decimal::ZERO {
                return Err(ExchangeError::validation("source slice cannot be negative"));
            }
            if slice - remaining > epsilon {
                return Err(ExchangeError::validation(format!(
                    "portion of {slice} {source} exceeds remaining source amount {remaining}"
                )));
            }
            // A fixed slice may overshoot by up to epsilon. Take in only what is left.
            let slice = slice.min(remaining);
            if slice < epsilon {
                continue;
            }
            if !self.rates.can_convert(source, target) {
                return Err(ExchangeError::RateNotFound {
                    from: source,
                    to: target,
                });
            }

            let converted = self.rates.convert(slice, source, target)?;
            let commission = converted
                .checked_mul(self.settings.commission)
                .ok_or_else(|| {
                    ExchangeError::validation(format!(
                        "commission on {converted} {target} is out of range"
                    ))
                })?;
            let payout = converted - commission;
            let commission_in_base = self.rates.convert(commission, target, base)?;

            reserve.withdraw(target, converted)?;
            reserve.deposit(target, commission)?;
            reserve.deposit(source, slice)?;

            debug!(
                "portion {slice} {source} -> {converted} {target} (pays {payout}, keeps {commission})"
            );

            profit_base = profit_base
                .checked_add(commission_in_base)
                .ok_or_else(|| {
                    ExchangeError::validation("transaction profit exceeds the representable range")
                })?;
            payouts.push(PayoutDetail {
                currency: target,
                amount_paid: payout,
                commission,
                denominations: portion.denominations().to_vec(),
            });
            remaining -= slice;
        }

        Ok(Settlement {
            quote: Quote {
                source_currency: source,
                source_consumed: request.total_amount() - remaining,
                returned_to_client: remaining,
                payouts,
                profit_base,
                commission_base: profit_base,
            },
            reserve,
        })
    }

    fn warn_if_below_critical(&self, currency: Currency) {
        if self.is_below_critical(currency) {
            warn!(
                "{} reserve at {} is below its critical minimum of {}",
                currency,
                self.reserve.balance(currency),
                self.critical_minimum(currency)
            );
        }
    }

    // --- Critical reserve thresholds ---

    /// Whether the balance is under the configured threshold. Currencies
    /// without a threshold are never critical.
    pub fn is_below_critical(&self, currency: Currency) -> bool {
        self.critical_minimums
            .get(&currency)
            .is_some_and(|threshold| self.reserve.balance(currency) < *threshold)
    }

    /// The configured threshold, or zero when none is set.
    pub fn critical_minimum(&self, currency: Currency) -> Amount {
        self.critical_minimums
            .get(&currency)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn set_critical_minimum(
        &mut self,
        currency: Currency,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        if amount < Decimal::ZERO {
            return Err(ExchangeError::validation(format!(
                "critical minimum cannot be negative, got {amount} {currency}"
            )));
        }
        self.critical_minimums.insert(currency, amount);
        info!("critical minimum for {} set to {}", currency, amount);
        Ok(())
    }

    /// Replace every threshold at once. Nothing changes if any is negative.
    pub fn initialize_critical_minimums(
        &mut self,
        minimums: BTreeMap<Currency, Amount>,
    ) -> Result<(), ExchangeError> {
        if let Some((currency, amount)) = minimums.iter().find(|(_, amount)| **amount < Decimal::ZERO)
        {
            return Err(ExchangeError::validation(format!(
                "critical minimum cannot be negative, got {amount} {currency}"
            )));
        }
        self.critical_minimums = minimums;
        Ok(())
    }

    /// Currencies currently under their threshold, in canonical order.
    pub fn currencies_below_critical(&self) -> Vec<Currency> {
        self.critical_minimums
            .keys()
            .copied()
            .filter(|currency| self.is_below_critical(*currency))
            .collect()
    }

    // --- Reserve and rate management ---

    pub fn top_up_reserve(&mut self, currency: Currency, amount: Amount) -> Result<(), ExchangeError> {
        self.reserve.deposit(currency, amount)?;
        info!("reserve topped up with {} {}", amount, currency);
        Ok(())
    }

    pub fn reduce_reserve(&mut self, currency: Currency, amount: Amount) -> Result<(), ExchangeError> {
        self.reserve.withdraw(currency, amount)?;
        info!("reserve reduced by {} {}", amount, currency);
        self.warn_if_below_critical(currency);
        Ok(())
    }

    pub fn update_rate(&mut self, from: Currency, to: Currency, rate: Amount) -> Result<(), ExchangeError> {
        self.rates.set_rate(from, to, rate)?;
        info!("exchange rate updated: 1 {} = {} {}", from, rate, to);
        Ok(())
    }

    // --- Daily cycle ---

    /// Snapshot of the trading day so far. Does not change the office.
    pub fn compile_daily_report(&self) -> DailyReport {
        DailyReport::new(
            self.starting_reserve.all_balances().clone(),
            self.reserve.all_balances().clone(),
            self.critical_minimums.clone(),
            self.history.clone(),
            self.profit_base,
            self.rates.base(),
            Utc::now(),
        )
    }

    /// Start a new trading day: the current reserve becomes the starting
    /// snapshot, history is cleared and profit zeroed. Receipt numbering
    /// carries on.
    pub fn reset_daily_cycle(&mut self) {
        info!(
            "daily cycle reset after {} transactions, profit {} {}",
            self.history.len(),
            self.profit_base,
            self.rates.base()
        );
        self.starting_reserve = self.reserve.clone();
        self.history.clear();
        self.profit_base = Decimal::ZERO;
    }

    // --- Accessors ---

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn reserve(&self) -> &Reserve {
        &self.reserve
    }

    pub fn starting_reserve(&self) -> &Reserve {
        &self.starting_reserve
    }

    pub fn critical_minimums(&self) -> &BTreeMap<Currency, Amount> {
        &self.critical_minimums
    }

    /// Profit accumulated since the last daily reset, in the base currency.
    pub fn current_profit(&self) -> Amount {
        self.profit_base
    }

    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    pub fn settings(&self) -> OfficeSettings {
        self.settings
    }

    pub fn next_receipt_id(&self) -> ReceiptId {
        self.next_receipt_id
    }
}
