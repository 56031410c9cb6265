//! Value transfer step for withdrawals
//!
//! The ledger finishes its bookkeeping before handing value to a [`Payout`],
//! so a payout implementation that calls back into the ledger observes the
//! post-withdrawal state.

use crate::core::{Address, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sink receiving value released by the ledger
pub trait Payout {
    fn pay(&mut self, to: &Address, amount: Amount);
}

/// One executed transfer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PayoutRecord {
    pub to: Address,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

/// In-process payout sink that records every transfer
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PayoutJournal {
    records: Vec<PayoutRecord>,
}

impl PayoutJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PayoutRecord] {
        &self.records
    }

    /// Total paid out to one address
    pub fn paid_to(&self, address: &Address) -> Amount {
        self.records
            .iter()
            .filter(|r| &r.to == address)
            .map(|r| r.amount)
            .sum()
    }
}

impl Payout for PayoutJournal {
    fn pay(&mut self, to: &Address, amount: Amount) {
        log::info!("Paying {} to {}", amount, to);
        self.records.push(PayoutRecord {
            to: to.clone(),
            amount,
            timestamp: Utc::now(),
        });
    }
}
