//! Persistence and identity collaborators of the office.
//!
//! The engine never touches storage itself. Front ends call a [`DataStore`]
//! after an engine operation has succeeded: to persist balances, rates and
//! thresholds, to log receipts and to file daily reports.

pub mod file;
pub mod memory;
pub mod people;

use crate::core::currency::{Amount, Currency};
use crate::core::party::{Party, PersonId, PersonRole};
use crate::core::rates::{RateEntry, RateTable};
use crate::core::receipt::Receipt;
use crate::engine::report::DailyReport;
use std::collections::BTreeMap;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid name {0:?}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage the office's front ends persist through.
pub trait DataStore {
    /// Stable id for `(role, name)`, assigning the next free one on first
    /// sight. Names are trimmed and compared case-insensitively.
    fn ensure_person_id(&mut self, role: PersonRole, name: &str) -> Result<PersonId>;

    /// Persisted balances laid over `defaults`. With nothing persisted yet,
    /// the defaults are saved and returned.
    fn load_reserve(&mut self, defaults: &BTreeMap<Currency, Amount>) -> Result<BTreeMap<Currency, Amount>>;
    fn save_reserve(&mut self, balances: &BTreeMap<Currency, Amount>) -> Result<()>;

    fn load_rates(&self) -> Result<Vec<RateEntry>>;
    /// Saves one entry per undirected pair.
    fn save_rates(&mut self, rates: &RateTable) -> Result<()>;

    fn load_critical_minimums(&self) -> Result<BTreeMap<Currency, Amount>>;
    fn save_critical_minimums(&mut self, minimums: &BTreeMap<Currency, Amount>) -> Result<()>;

    fn append_transaction(&mut self, receipt: &Receipt) -> Result<()>;

    /// File a human-readable report, returning where it went.
    fn persist_report(&mut self, report: &DailyReport, manager: &Party) -> Result<String>;
}

/// Body of a persisted report: who asked for it, then the report itself.
pub(crate) fn render_report(report: &DailyReport, manager: &Party) -> String {
    format!("Manager: {manager}\n{report}")
}
