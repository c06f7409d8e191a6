//! Office staff and what each role may do to the office.
//!
//! A [`Cashier`] can only serve clients and read reserve alerts. A
//! [`Manager`] adjusts rates, thresholds and the till, runs the daily cycle
//! and owns the bonus policy it was hired with.

use crate::core::currency::{Amount, Currency};
use crate::core::party::{Party, PersonRole};
use crate::core::receipt::Receipt;
use crate::core::request::ExchangeRequest;
use crate::engine::bonus::BonusPolicy;
use crate::engine::office::ExchangeOffice;
use crate::engine::report::DailyReport;
use crate::error::ExchangeError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Cashier,
    Manager,
}

impl Role {
    pub fn person_role(&self) -> PersonRole {
        match self {
            Role::Cashier => PersonRole::Cashier,
            Role::Manager => PersonRole::Manager,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Cashier => f.write_str("Cashier"),
            Role::Manager => f.write_str("Manager"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cashier {
    identity: Party,
}

impl Cashier {
    pub fn new(identity: Party) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Party {
        &self.identity
    }

    pub fn handle_request(
        &self,
        office: &mut ExchangeOffice,
        request: &ExchangeRequest,
    ) -> Result<Receipt, ExchangeError> {
        office.execute_transaction(request, &self.identity)
    }

    /// Currencies the cashier should flag as running low.
    pub fn low_reserve_alerts(&self, office: &ExchangeOffice) -> Vec<Currency> {
        office.currencies_below_critical()
    }
}

/// A daily report together with the bonus it earns.
#[derive(Debug, Clone)]
pub struct DailySummary {
    pub report: DailyReport,
    pub bonus: Amount,
}

pub struct Manager {
    identity: Party,
    bonus_policy: Box<dyn BonusPolicy>,
}

impl Manager {
    pub fn new(identity: Party, bonus_policy: Box<dyn BonusPolicy>) -> Self {
        Self {
            identity,
            bonus_policy,
        }
    }

    pub fn identity(&self) -> &Party {
        &self.identity
    }

    pub fn set_exchange_rate(
        &self,
        office: &mut ExchangeOffice,
        from: Currency,
        to: Currency,
        rate: Amount,
    ) -> Result<(), ExchangeError> {
        office.update_rate(from, to, rate)
    }

    pub fn set_critical_reserve(
        &self,
        office: &mut ExchangeOffice,
        currency: Currency,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        office.set_critical_minimum(currency, amount)
    }

    pub fn top_up_reserve(
        &self,
        office: &mut ExchangeOffice,
        currency: Currency,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        office.top_up_reserve(currency, amount)
    }

    pub fn reduce_reserve(
        &self,
        office: &mut ExchangeOffice,
        currency: Currency,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        office.reduce_reserve(currency, amount)
    }

    pub fn compile_daily_report(&self, office: &ExchangeOffice) -> DailyReport {
        office.compile_daily_report()
    }

    pub fn reset_daily_cycle(&self, office: &mut ExchangeOffice) {
        office.reset_daily_cycle()
    }

    pub fn calculate_bonus(&self, profit_base: Amount) -> Amount {
        self.bonus_policy.calculate_bonus(profit_base)
    }

    pub fn daily_summary(&self, office: &ExchangeOffice) -> DailySummary {
        let report = office.compile_daily_report();
        let bonus = self.calculate_bonus(report.total_profit());
        DailySummary { report, bonus }
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Anyone working at the office.
#[derive(Debug)]
pub enum Staff {
    Cashier(Cashier),
    Manager(Manager),
}

impl Staff {
    pub fn role(&self) -> Role {
        match self {
            Staff::Cashier(_) => Role::Cashier,
            Staff::Manager(_) => Role::Manager,
        }
    }

    pub fn identity(&self) -> &Party {
        match self {
            Staff::Cashier(cashier) => cashier.identity(),
            Staff::Manager(manager) => manager.identity(),
        }
    }
}

impl fmt::Display for Staff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role(), self.identity())
    }
}
