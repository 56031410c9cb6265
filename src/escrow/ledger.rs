//! Pooled escrow ledger
//!
//! Any account may deposit into a shared pool. Only the recipient may
//! withdraw, and only the owner may change the recipient or halt the ledger.
//!
//! The ledger tracks gross contribution per depositor separately from the
//! pool balance: withdrawals shrink the pool, never a depositor's record.

use crate::core::{Address, Amount, ContractError, Role};
use crate::escrow::payout::Payout;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Emitted on every accepted deposit
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Deposited {
    pub depositor: Address,
    #[serde(with = "crate::core::decimal")]
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

/// Emitted on every withdrawal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Withdrawn {
    pub recipient: Address,
    #[serde(with = "crate::core::decimal")]
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when the owner swaps the recipient
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecipientChanged {
    pub previous: Address,
    pub current: Address,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when the owner halts or resumes the ledger
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HaltChanged {
    pub halted: bool,
    pub timestamp: DateTime<Utc>,
}

/// Ledger notifications
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum LedgerEvent {
    Deposited(Deposited),
    Withdrawn(Withdrawn),
    RecipientChanged(RecipientChanged),
    HaltChanged(HaltChanged),
}

impl From<Deposited> for LedgerEvent {
    fn from(event: Deposited) -> Self {
        LedgerEvent::Deposited(event)
    }
}

impl From<Withdrawn> for LedgerEvent {
    fn from(event: Withdrawn) -> Self {
        LedgerEvent::Withdrawn(event)
    }
}

impl From<RecipientChanged> for LedgerEvent {
    fn from(event: RecipientChanged) -> Self {
        LedgerEvent::RecipientChanged(event)
    }
}

impl From<HaltChanged> for LedgerEvent {
    fn from(event: HaltChanged) -> Self {
        LedgerEvent::HaltChanged(event)
    }
}

/// Aggregate view of the ledger
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LedgerStats {
    pub address: Address,
    pub pool_balance: Amount,
    pub total_received: Amount,
    pub total_withdrawn: Amount,
    pub depositor_count: usize,
    pub recipient: Address,
    pub owner: Address,
    pub halted: bool,
}

/// One enumerated depositor
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Depositor {
    pub address: Address,
    pub cumulative: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscrowLedger {
    address: Address,
    owner: Address,
    recipient: Address,
    pool_balance: Amount,
    total_received: Amount,
    total_withdrawn: Amount,
    /// Depositors in order of first contribution
    depositors: Vec<Address>,
    contributions: HashMap<Address, Amount>,
    halted: bool,
}

impl EscrowLedger {
    /// Create a ledger whose address is derived from owner and recipient
    pub fn new(owner: Address, recipient: Address) -> Result<Self, ContractError> {
        Self::with_nonce(owner, recipient, 0)
    }

    /// Create a ledger, mixing `nonce` into its address
    pub fn with_nonce(
        owner: Address,
        recipient: Address,
        nonce: u64,
    ) -> Result<Self, ContractError> {
        if owner.is_null() {
            return Err(ContractError::InvalidArgument(
                "owner cannot be the null address".to_string(),
            ));
        }
        if recipient.is_null() {
            return Err(ContractError::InvalidArgument(
                "recipient cannot be the null address".to_string(),
            ));
        }

        let address = Address::derive(&[owner.as_str(), recipient.as_str(), &nonce.to_string()]);

        Ok(Self {
            address,
            owner,
            recipient,
            pool_balance: 0,
            total_received: 0,
            total_withdrawn: 0,
            depositors: Vec::new(),
            contributions: HashMap::new(),
            halted: false,
        })
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn pool_balance(&self) -> Amount {
        self.pool_balance
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn depositor_count(&self) -> usize {
        self.depositors.len()
    }

    /// Gross amount ever deposited by an address
    pub fn contribution_of(&self, address: &Address) -> Amount {
        self.contributions.get(address).copied().unwrap_or(0)
    }

    /// Every tracked field in one read
    pub fn get_stats(&self) -> LedgerStats {
        LedgerStats {
            address: self.address.clone(),
            pool_balance: self.pool_balance,
            total_received: self.total_received,
            total_withdrawn: self.total_withdrawn,
            depositor_count: self.depositors.len(),
            recipient: self.recipient.clone(),
            owner: self.owner.clone(),
            halted: self.halted,
        }
    }

    /// Depositor at the given enumeration index
    pub fn get_depositor(&self, index: usize) -> Result<Depositor, ContractError> {
        let address = self
            .depositors
            .get(index)
            .ok_or(ContractError::OutOfRange {
                index,
                len: self.depositors.len(),
            })?;

        Ok(Depositor {
            address: address.clone(),
            cumulative: self.contribution_of(address),
        })
    }

    /// All depositors in order of first contribution
    pub fn depositors(&self) -> Vec<Depositor> {
        self.depositors
            .iter()
            .map(|address| Depositor {
                address: address.clone(),
                cumulative: self.contribution_of(address),
            })
            .collect()
    }

    /// Check the bookkeeping invariants of a ledger read from storage
    pub fn validate(&self) -> Result<(), String> {
        if self.owner.is_null() || self.recipient.is_null() {
            return Err("ledger owner and recipient must not be null".to_string());
        }

        let mut seen = HashSet::new();
        for address in &self.depositors {
            if !seen.insert(address) {
                return Err(format!("depositor {} is listed twice", address));
            }
            if self.contribution_of(address) == 0 {
                return Err(format!("depositor {} has no contribution", address));
            }
        }
        if self.contributions.len() != self.depositors.len() {
            return Err("contributions do not match the depositor list".to_string());
        }

        let contributed = self
            .contributions
            .values()
            .try_fold(0u128, |acc, amount| acc.checked_add(*amount))
            .ok_or("contributions overflow")?;
        if contributed != self.total_received {
            return Err(format!(
                "total received {} differs from the sum of contributions {}",
                self.total_received, contributed
            ));
        }

        if self.pool_balance.checked_add(self.total_withdrawn) != Some(self.total_received) {
            return Err(format!(
                "pool balance {} plus withdrawn {} differs from received {}",
                self.pool_balance, self.total_withdrawn, self.total_received
            ));
        }

        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `amount` from `caller` to the pool
    pub fn deposit(&mut self, caller: &Address, amount: Amount) -> Result<Deposited, ContractError> {
        if self.halted {
            return Err(ContractError::Halted);
        }
        if amount == 0 {
            return Err(ContractError::InvalidArgument(
                "deposit amount must be greater than 0".to_string(),
            ));
        }

        let previous = self.contribution_of(caller);
        let overflow = || ContractError::InvalidArgument("deposit overflows ledger totals".to_string());
        let contribution = previous.checked_add(amount).ok_or_else(overflow)?;
        let total_received = self.total_received.checked_add(amount).ok_or_else(overflow)?;
        let pool_balance = self.pool_balance.checked_add(amount).ok_or_else(overflow)?;

        if previous == 0 {
            self.depositors.push(caller.clone());
        }
        self.contributions.insert(caller.clone(), contribution);
        self.total_received = total_received;
        self.pool_balance = pool_balance;

        Ok(Deposited {
            depositor: caller.clone(),
            amount,
            timestamp: Utc::now(),
        })
    }

    /// Release the whole pool to the recipient
    pub fn withdraw(
        &mut self,
        caller: &Address,
        payout: &mut impl Payout,
    ) -> Result<Withdrawn, ContractError> {
        self.check_withdrawal(caller)?;
        if self.pool_balance == 0 {
            return Err(ContractError::InsufficientFunds {
                available: 0,
                requested: 0,
            });
        }

        let amount = self.pool_balance;
        Ok(self.release(amount, payout))
    }

    /// Release part of the pool to the recipient
    pub fn withdraw_amount(
        &mut self,
        caller: &Address,
        amount: Amount,
        payout: &mut impl Payout,
    ) -> Result<Withdrawn, ContractError> {
        self.check_withdrawal(caller)?;
        if amount == 0 {
            return Err(ContractError::InvalidArgument(
                "withdrawal amount must be greater than 0".to_string(),
            ));
        }
        if amount > self.pool_balance {
            return Err(ContractError::InsufficientFunds {
                available: self.pool_balance,
                requested: amount,
            });
        }

        Ok(self.release(amount, payout))
    }

    /// Swap the withdrawal recipient
    pub fn change_recipient(
        &mut self,
        caller: &Address,
        new_recipient: Address,
    ) -> Result<RecipientChanged, ContractError> {
        self.require_owner(caller)?;
        if new_recipient.is_null() {
            return Err(ContractError::InvalidArgument(
                "recipient cannot be the null address".to_string(),
            ));
        }
        if new_recipient
            .as_str()
            .trim()
            .eq_ignore_ascii_case(self.address.as_str())
        {
            return Err(ContractError::InvalidArgument(
                "recipient cannot be the ledger itself".to_string(),
            ));
        }

        let previous = std::mem::replace(&mut self.recipient, new_recipient);

        Ok(RecipientChanged {
            previous,
            current: self.recipient.clone(),
            timestamp: Utc::now(),
        })
    }

    /// Reject deposits and withdrawals until resumed
    pub fn halt(&mut self, caller: &Address) -> Result<HaltChanged, ContractError> {
        self.set_halted(caller, true)
    }

    /// Lift a previous halt
    pub fn resume(&mut self, caller: &Address) -> Result<HaltChanged, ContractError> {
        self.set_halted(caller, false)
    }

    fn set_halted(&mut self, caller: &Address, halted: bool) -> Result<HaltChanged, ContractError> {
        self.require_owner(caller)?;
        if self.halted == halted {
            let state = if halted { "already halted" } else { "not halted" };
            return Err(ContractError::InvalidArgument(format!("ledger is {}", state)));
        }

        self.halted = halted;

        Ok(HaltChanged {
            halted,
            timestamp: Utc::now(),
        })
    }

    fn require_owner(&self, caller: &Address) -> Result<(), ContractError> {
        if *caller != self.owner {
            return Err(ContractError::Unauthorized {
                caller: caller.clone(),
                required: Role::Owner,
            });
        }
        Ok(())
    }

    fn check_withdrawal(&self, caller: &Address) -> Result<(), ContractError> {
        if *caller != self.recipient {
            return Err(ContractError::Unauthorized {
                caller: caller.clone(),
                required: Role::Recipient,
            });
        }
        if self.halted {
            return Err(ContractError::Halted);
        }
        Ok(())
    }

    /// Bookkeeping first, then the transfer
    fn release(&mut self, amount: Amount, payout: &mut impl Payout) -> Withdrawn {
        self.pool_balance -= amount;
        self.total_withdrawn += amount;

        payout.pay(&self.recipient, amount);

        Withdrawn {
            recipient: self.recipient.clone(),
            amount,
            timestamp: Utc::now(),
        }
    }
}
