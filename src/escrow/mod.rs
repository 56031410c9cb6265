//! Escrow ledger
//!
//! Pools contributions from any number of depositors and releases them to a
//! single authorized recipient.
//!
//! # Example
//!
//! ```rust
//! use escrow_registry::core::Address;
//! use escrow_registry::escrow::{EscrowLedger, PayoutJournal};
//!
//! let mut ledger = EscrowLedger::new(Address::new("owner"), Address::new("recipient")).unwrap();
//! let mut journal = PayoutJournal::new();
//!
//! ledger.deposit(&Address::new("alice"), 100).unwrap();
//! ledger.deposit(&Address::new("bob"), 50).unwrap();
//!
//! let withdrawn = ledger.withdraw(&Address::new("recipient"), &mut journal).unwrap();
//! assert_eq!(withdrawn.amount, 150);
//! assert_eq!(ledger.get_stats().pool_balance, 0);
//! ```

pub mod ledger;
pub mod payout;

pub use ledger::{
    Deposited, Depositor, EscrowLedger, HaltChanged, LedgerEvent, LedgerStats, RecipientChanged,
    Withdrawn,
};
pub use payout::{Payout, PayoutJournal, PayoutRecord};
