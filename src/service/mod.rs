//! Serialized contract service
//!
//! Wraps the registry and the ledger behind one lock, commits state through a
//! [`StateStore`](crate::storage::StateStore) after each mutation and
//! publishes the resulting notification.

pub mod service;
pub mod state;

pub use service::{ContractService, ServiceError};
pub use state::{ContractState, LedgerSetup};
