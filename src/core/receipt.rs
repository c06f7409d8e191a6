use crate::core::currency::{Amount, Currency};
use crate::core::party::Party;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential receipt number, starting at 1 for each office.
pub type ReceiptId = u64;

/// What the client received for one portion of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutDetail {
    pub currency: Currency,
    /// Net amount handed to the client.
    pub amount_paid: Amount,
    /// Commission withheld, in the payout currency.
    pub commission: Amount,
    pub denominations: Vec<u32>,
}

/// Immutable record of one completed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    id: ReceiptId,
    cashier: Party,
    client: Party,
    source_currency: Currency,
    /// Source amount actually consumed; any leftover went back to the client.
    source_amount: Amount,
    payouts: Vec<PayoutDetail>,
    profit_base: Amount,
    commission_base: Amount,
    timestamp: DateTime<Utc>,
}

impl Receipt {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ReceiptId,
        cashier: Party,
        client: Party,
        source_currency: Currency,
        source_amount: Amount,
        payouts: Vec<PayoutDetail>,
        profit_base: Amount,
        commission_base: Amount,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            cashier,
            client,
            source_currency,
            source_amount,
            payouts,
            profit_base,
            commission_base,
            timestamp,
        }
    }

    // --- Accessors ---

    pub fn id(&self) -> ReceiptId {
        self.id
    }

    pub fn cashier(&self) -> &Party {
        &self.cashier
    }

    pub fn client(&self) -> &Party {
        &self.client
    }

    pub fn source_currency(&self) -> Currency {
        self.source_currency
    }

    pub fn source_amount(&self) -> Amount {
        self.source_amount
    }

    pub fn payouts(&self) -> &[PayoutDetail] {
        &self.payouts
    }

    /// Profit in the base currency.
    pub fn profit_base(&self) -> Amount {
        self.profit_base
    }

    /// Commission collected, valued in the base currency.
    pub fn commission_base(&self) -> Amount {
        self.commission_base
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Receipt #{} for client {} handled by {}",
            self.id, self.client, self.cashier
        )?;
        writeln!(
            f,
            "Source: {} amount {:.2}",
            self.source_currency, self.source_amount
        )?;
        for payout in &self.payouts {
            write!(f, "  -> {} amount: {:.2}", payout.currency, payout.amount_paid)?;
            if !payout.denominations.is_empty() {
                let notes: Vec<String> = payout.denominations.iter().map(u32::to_string).collect();
                write!(f, " (denominations: {})", notes.join(", "))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Profit (base): {:.2}", self.profit_base)
    }
}

/// The lighter form of a receipt kept in the day's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub receipt_id: ReceiptId,
    pub cashier: Party,
    pub client: Party,
    pub source_currency: Currency,
    pub source_amount: Amount,
    pub payouts: Vec<PayoutDetail>,
    pub profit_base: Amount,
    pub timestamp: DateTime<Utc>,
}

impl From<&Receipt> for TransactionRecord {
    fn from(receipt: &Receipt) -> Self {
        Self {
            receipt_id: receipt.id,
            cashier: receipt.cashier.clone(),
            client: receipt.client.clone(),
            source_currency: receipt.source_currency,
            source_amount: receipt.source_amount,
            payouts: receipt.payouts.clone(),
            profit_base: receipt.profit_base,
            timestamp: receipt.timestamp,
        }
    }
}
