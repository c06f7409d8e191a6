use crate::core::currency::{Amount, Currency};
use crate::core::party::{Party, PersonId, PersonRole};
use crate::core::rates::{RateEntry, RateTable};
use crate::core::receipt::{Receipt, TransactionRecord};
use crate::engine::report::DailyReport;
use crate::store::people::PeopleRegistry;
use crate::store::{render_report, DataStore, Result};
use std::collections::BTreeMap;

/// Process-local store for tests and simulations.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    people: PeopleRegistry,
    reserve: Option<BTreeMap<Currency, Amount>>,
    rates: Vec<RateEntry>,
    critical_minimums: BTreeMap<Currency, Amount>,
    transactions: Vec<TransactionRecord>,
    reports: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed persisted rates, as if loaded from an earlier run.
    pub fn with_rates(mut self, rates: impl IntoIterator<Item = RateEntry>) -> Self {
        self.rates = rates.into_iter().collect();
        self
    }

    // --- Accessors ---

    pub fn people(&self) -> &PeopleRegistry {
        &self.people
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    /// Rendered reports, oldest first.
    pub fn reports(&self) -> &[String] {
        &self.reports
    }
}

impl DataStore for MemoryStore {
    fn ensure_person_id(&mut self, role: PersonRole, name: &str) -> Result<PersonId> {
        Ok(self.people.ensure(role, name)?.0)
    }

    fn load_reserve(&mut self, defaults: &BTreeMap<Currency, Amount>) -> Result<BTreeMap<Currency, Amount>> {
        let balances = self.reserve.get_or_insert_with(|| defaults.clone());
        let mut merged = defaults.clone();
        merged.extend(balances.iter().map(|(&c, &a)| (c, a)));
        Ok(merged)
    }

    fn save_reserve(&mut self, balances: &BTreeMap<Currency, Amount>) -> Result<()> {
        self.reserve = Some(balances.clone());
        Ok(())
    }

    fn load_rates(&self) -> Result<Vec<RateEntry>> {
        Ok(self.rates.clone())
    }

    fn save_rates(&mut self, rates: &RateTable) -> Result<()> {
        self.rates = rates.entries();
        Ok(())
    }

    fn load_critical_minimums(&self) -> Result<BTreeMap<Currency, Amount>> {
        Ok(self.critical_minimums.clone())
    }

    fn save_critical_minimums(&mut self, minimums: &BTreeMap<Currency, Amount>) -> Result<()> {
        self.critical_minimums = minimums.clone();
        Ok(())
    }

    fn append_transaction(&mut self, receipt: &Receipt) -> Result<()> {
        self.transactions.push(TransactionRecord::from(receipt));
        Ok(())
    }

    fn persist_report(&mut self, report: &DailyReport, manager: &Party) -> Result<String> {
        self.reports.push(render_report(report, manager));
        Ok(format!("memory:report-{}", self.reports.len()))
    }
}
