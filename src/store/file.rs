use crate::core::currency::{Amount, Currency};
use crate::core::party::{Party, PersonId, PersonRole};
use crate::core::rates::{RateEntry, RateTable};
use crate::core::receipt::Receipt;
use crate::engine::report::DailyReport;
use crate::store::people::{PeopleRegistry, PersonEntry};
use crate::store::{render_report, DataStore, Result};
use csv::{ReaderBuilder, WriterBuilder};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// `currency,amount` rows, used for both balances and thresholds.
#[derive(Serialize, Deserialize)]
struct AmountRow {
    currency: Currency,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Amount,
}

/// One line of `transactions.log`.
#[derive(Serialize)]
struct TransactionLine<'a> {
    timestamp: i64,
    receipt_id: u64,
    cashier_id: PersonId,
    cashier: &'a str,
    client_id: PersonId,
    client: &'a str,
    source_currency: Currency,
    source_amount: Amount,
    profit_base: Amount,
    commission_base: Amount,
}

/// CSV files under one data directory:
///
/// ```text
/// <dir>/reserve.csv        currency,amount
/// <dir>/rates.csv          from,to,rate
/// <dir>/critical.csv       currency,amount
/// <dir>/people.csv         role,id,name
/// <dir>/transactions.log   pipe-delimited, one line per receipt
/// <dir>/reports/           report-YYYYMMDD-HHMMSS.txt
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    people: PeopleRegistry,
}

impl FileStore {
    /// Open (creating if needed) the data directory and load the people registry.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(dir.join("reports"))?;
        let mut store = Self {
            dir,
            people: PeopleRegistry::new(),
        };
        for entry in read_rows::<PersonEntry>(&store.people_file())? {
            store.people.insert(entry);
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn reserve_file(&self) -> PathBuf {
        self.dir.join("reserve.csv")
    }

    fn rates_file(&self) -> PathBuf {
        self.dir.join("rates.csv")
    }

    fn critical_file(&self) -> PathBuf {
        self.dir.join("critical.csv")
    }

    fn people_file(&self) -> PathBuf {
        self.dir.join("people.csv")
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.dir.join("transactions.log")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.dir.join("reports")
    }
}

/// Read every well-formed row of a headed CSV file. A missing file reads as
/// empty; malformed rows are skipped.
fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<T>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => warn!("skipping malformed row {} in {}: {}", line + 2, path.display(), e),
        }
    }
    Ok(rows)
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_amounts(path: &Path) -> Result<BTreeMap<Currency, Amount>> {
    Ok(read_rows::<AmountRow>(path)?
        .into_iter()
        .map(|row| (row.currency, row.amount))
        .collect())
}

fn write_amounts(path: &Path, amounts: &BTreeMap<Currency, Amount>) -> Result<()> {
    write_rows(
        path,
        amounts.iter().map(|(&currency, &amount)| AmountRow { currency, amount }),
    )
}

impl DataStore for FileStore {
    fn ensure_person_id(&mut self, role: PersonRole, name: &str) -> Result<PersonId> {
        let (id, created) = self.people.ensure(role, name)?;
        if created {
            write_rows(&self.people_file(), self.people.entries())?;
        }
        Ok(id)
    }

    fn load_reserve(&mut self, defaults: &BTreeMap<Currency, Amount>) -> Result<BTreeMap<Currency, Amount>> {
        let path = self.reserve_file();
        if !path.exists() {
            self.save_reserve(defaults)?;
            return Ok(defaults.clone());
        }
        let mut balances = defaults.clone();
        balances.extend(read_amounts(&path)?);
        Ok(balances)
    }

    fn save_reserve(&mut self, balances: &BTreeMap<Currency, Amount>) -> Result<()> {
        write_amounts(&self.reserve_file(), balances)
    }

    fn load_rates(&self) -> Result<Vec<RateEntry>> {
        read_rows(&self.rates_file())
    }

    fn save_rates(&mut self, rates: &RateTable) -> Result<()> {
        write_rows(&self.rates_file(), rates.entries())
    }

    fn load_critical_minimums(&self) -> Result<BTreeMap<Currency, Amount>> {
        read_amounts(&self.critical_file())
    }

    fn save_critical_minimums(&mut self, minimums: &BTreeMap<Currency, Amount>) -> Result<()> {
        write_amounts(&self.critical_file(), minimums)
    }

    fn append_transaction(&mut self, receipt: &Receipt) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.transactions_file())?;
        let mut writer = WriterBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .from_writer(file);
        writer.serialize(TransactionLine {
            timestamp: receipt.timestamp().timestamp(),
            receipt_id: receipt.id(),
            cashier_id: receipt.cashier().id,
            cashier: &receipt.cashier().name,
            client_id: receipt.client().id,
            client: &receipt.client().name,
            source_currency: receipt.source_currency(),
            source_amount: receipt.source_amount().round_dp(2),
            profit_base: receipt.profit_base().round_dp(2),
            commission_base: receipt.commission_base().round_dp(2),
        })?;
        writer.flush()?;
        Ok(())
    }

    fn persist_report(&mut self, report: &DailyReport, manager: &Party) -> Result<String> {
        let name = report
            .generated_at()
            .format("report-%Y%m%d-%H%M%S.txt")
            .to_string();
        let path = self.reports_dir().join(name);
        fs::write(&path, render_report(report, manager))?;
        info!("daily report saved to {}", path.display());
        Ok(path.display().to_string())
    }
}
