//! # exchange-office
//!
//! Transaction and ledger engine for a currency-exchange office.
//!
//! An office holds a reserve of cash in a closed set of currencies, a table
//! of exchange rates around a base currency and critical-minimum thresholds.
//! Clients hand in one currency and ask for one or more others; the office
//! converts, keeps a commission, pays out and books the profit. Every
//! transaction either applies completely or leaves the office untouched.
//!
//! ## Architecture
//!
//! - **core**: Leaf types: currencies, rates, reserve, parties, requests, receipts
//! - **engine**: The office, daily reports, bonus policies, staff roles, shared handle
//! - **store**: Persistence of balances, rates, thresholds, people and receipts
//! - **simulation**: Generated trading days for demos and benchmarks
//! - **config**: JSON office configuration

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod simulation;
pub mod store;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::OfficeConfig;
    pub use crate::core::currency::{Amount, Currency};
    pub use crate::core::party::{Party, PersonId, PersonRole};
    pub use crate::core::rates::RateTable;
    pub use crate::core::receipt::{Receipt, TransactionRecord};
    pub use crate::core::request::{ExchangePortion, ExchangeRequest};
    pub use crate::core::reserve::Reserve;
    pub use crate::engine::bonus::{BonusPolicy, CappedBonusPolicy, PercentageBonusPolicy};
    pub use crate::engine::office::{ExchangeOffice, OfficeSettings, Quote};
    pub use crate::engine::report::DailyReport;
    pub use crate::engine::shared::SharedOffice;
    pub use crate::engine::staff::{Cashier, Manager, Role, Staff};
    pub use crate::error::{ErrorKind, ExchangeError};
    pub use crate::store::{DataStore, FileStore, MemoryStore};
}
