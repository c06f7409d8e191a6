use crate::core::currency::{Amount, Currency};
use crate::core::receipt::TransactionRecord;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of one trading day: reserve at the start and now, thresholds,
/// every transaction so far and the profit they made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    starting_balances: BTreeMap<Currency, Amount>,
    ending_balances: BTreeMap<Currency, Amount>,
    critical_minimums: BTreeMap<Currency, Amount>,
    history: Vec<TransactionRecord>,
    /// Profit in `base_currency`.
    total_profit: Amount,
    base_currency: Currency,
    generated_at: DateTime<Utc>,
}

impl DailyReport {
    pub(crate) fn new(
        starting_balances: BTreeMap<Currency, Amount>,
        ending_balances: BTreeMap<Currency, Amount>,
        critical_minimums: BTreeMap<Currency, Amount>,
        history: Vec<TransactionRecord>,
        total_profit: Amount,
        base_currency: Currency,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            starting_balances,
            ending_balances,
            critical_minimums,
            history,
            total_profit,
            base_currency,
            generated_at,
        }
    }

    pub fn starting_balances(&self) -> &BTreeMap<Currency, Amount> {
        &self.starting_balances
    }

    pub fn ending_balances(&self) -> &BTreeMap<Currency, Amount> {
        &self.ending_balances
    }

    pub fn critical_minimums(&self) -> &BTreeMap<Currency, Amount> {
        &self.critical_minimums
    }

    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    pub fn total_profit(&self) -> Amount {
        self.total_profit
    }

    pub fn base_currency(&self) -> Currency {
        self.base_currency
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn transaction_count(&self) -> usize {
        self.history.len()
    }

    /// Ending minus starting balance.
    pub fn net_change(&self, currency: Currency) -> Amount {
        let start = self.starting_balances.get(&currency).copied().unwrap_or(Decimal::ZERO);
        let end = self.ending_balances.get(&currency).copied().unwrap_or(Decimal::ZERO);
        end - start
    }

    /// Currencies whose ending balance is under their threshold.
    pub fn below_critical(&self) -> Vec<Currency> {
        self.critical_minimums
            .iter()
            .filter(|(currency, threshold)| {
                self.ending_balances.get(*currency).copied().unwrap_or(Decimal::ZERO) < **threshold
            })
            .map(|(currency, _)| *currency)
            .collect()
    }

    /// Ending balance as a multiple of the threshold. `None` when there is
    /// no positive threshold to compare against.
    pub fn coverage_ratio(&self, currency: Currency) -> Option<f64> {
        let threshold = *self.critical_minimums.get(&currency)?;
        if threshold <= Decimal::ZERO {
            return None;
        }
        let balance = self.ending_balances.get(&currency).copied().unwrap_or(Decimal::ZERO);
        (balance / threshold).to_f64()
    }
}

impl std::fmt::Display for DailyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Daily Report ===")?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(
            f,
            "Profit (base currency): {:.2} {}",
            self.total_profit, self.base_currency
        )?;
        writeln!(f, "Transactions: {}", self.history.len())?;

        writeln!(f, "\nEnding reserves:")?;
        for (currency, balance) in &self.ending_balances {
            write!(
                f,
                "  {}: {:.2} (start {:.2})",
                currency,
                balance,
                self.starting_balances.get(currency).copied().unwrap_or(Decimal::ZERO)
            )?;
            if let Some(threshold) = self.critical_minimums.get(currency) {
                write!(f, " (critical min {:.2})", threshold)?;
                if balance < threshold {
                    write!(f, " LOW")?;
                }
            }
            writeln!(f)?;
        }

        writeln!(f, "\nTransactions:")?;
        for record in &self.history {
            writeln!(
                f,
                "  Receipt #{} | Cashier {} | Client {} | Source {} {:.2} | Profit base {:.2}",
                record.receipt_id,
                record.cashier,
                record.client,
                record.source_currency,
                record.source_amount,
                record.profit_base
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::party::Party;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn report() -> DailyReport {
        DailyReport::new(
            BTreeMap::from([(Currency::Usd, dec!(1000)), (Currency::Local, dec!(1000))]),
            BTreeMap::from([(Currency::Usd, dec!(1100)), (Currency::Local, dec!(895.24))]),
            BTreeMap::from([(Currency::Local, dec!(900)), (Currency::Usd, dec!(500))]),
            vec![TransactionRecord {
                receipt_id: 1,
                cashier: Party::new(1, "Carol"),
                client: Party::new(2, "Dave"),
                source_currency: Currency::Usd,
                source_amount: dec!(100),
                payouts: Vec::new(),
                profit_base: dec!(3.24),
                timestamp: Utc::now(),
            }],
            dec!(3.24),
            Currency::Local,
            Utc::now(),
        )
    }

    #[test]
    fn test_net_change() {
        let report = report();
        assert_eq!(report.net_change(Currency::Usd), dec!(100));
        assert_eq!(report.net_change(Currency::Local), dec!(-104.76));
        assert_eq!(report.net_change(Currency::Gbp), Decimal::ZERO);
    }

    #[test]
    fn test_below_critical() {
        assert_eq!(report().below_critical(), vec![Currency::Local]);
    }

    #[test]
    fn test_coverage_ratio() {
        let report = report();
        assert_relative_eq!(report.coverage_ratio(Currency::Usd).unwrap(), 2.2, epsilon = 1e-9);
        assert_relative_eq!(
            report.coverage_ratio(Currency::Local).unwrap(),
            0.9947111,
            epsilon = 1e-6
        );
        assert!(report.coverage_ratio(Currency::Eur).is_none());
    }

    #[test]
    fn test_report_display() {
        let text = report().to_string();
        assert!(text.contains("Profit (base currency): 3.24 LOCAL"));
        assert!(text.contains("LOCAL: 895.24 (start 1000.00) (critical min 900.00) LOW"));
        assert!(text.contains("Receipt #1 | Cashier Carol (ID 1) | Client Dave (ID 2)"));
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["total_profit"], "3.24");
        assert_eq!(json["base_currency"], "LOCAL");
        assert_eq!(json["ending_balances"]["USD"], "1100");
    }
}
