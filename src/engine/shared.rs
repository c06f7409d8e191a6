use crate::core::party::Party;
use crate::core::receipt::Receipt;
use crate::core::request::ExchangeRequest;
use crate::engine::office::ExchangeOffice;
use crate::engine::report::DailyReport;
use crate::error::ExchangeError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to one office for front ends serving concurrent callers.
///
/// Every call holds a single lock for its whole duration, so transactions,
/// reports and resets never interleave.
#[derive(Debug, Clone)]
pub struct SharedOffice {
    office: Arc<Mutex<ExchangeOffice>>,
}

impl SharedOffice {
    pub fn new(office: ExchangeOffice) -> Self {
        Self {
            office: Arc::new(Mutex::new(office)),
        }
    }

    // Engine operations finish every fallible step before they mutate, so a
    // poisoned lock is recovered. A closure passed to `with` that panics
    // midway may leave its own edits half done.
    fn lock(&self) -> MutexGuard<'_, ExchangeOffice> {
        self.office.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn execute_transaction(
        &self,
        request: &ExchangeRequest,
        cashier: &Party,
    ) -> Result<Receipt, ExchangeError> {
        self.lock().execute_transaction(request, cashier)
    }

    pub fn compile_daily_report(&self) -> DailyReport {
        self.lock().compile_daily_report()
    }

    pub fn reset_daily_cycle(&self) {
        self.lock().reset_daily_cycle()
    }

    /// Run `f` with exclusive access to the office.
    pub fn with<R>(&self, f: impl FnOnce(&mut ExchangeOffice) -> R) -> R {
        f(&mut self.lock())
    }
}
