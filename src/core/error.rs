//! Contract-level error taxonomy
//!
//! Every rejected precondition maps to exactly one variant. Errors are raised
//! before any state is touched, so a failed call never has partial effects.

use crate::core::address::{Address, Amount};
use thiserror::Error;

/// Errors returned by registry and ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Index out of range: {index} (length {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("Unauthorized: {caller} is not the {required}")]
    Unauthorized { caller: Address, required: Role },
    #[error("Insufficient funds: have {available}, need {requested}")]
    InsufficientFunds { available: Amount, requested: Amount },
    #[error("Ledger is halted")]
    Halted,
}

impl ContractError {
    /// Stable machine-readable tag for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ContractError::InvalidArgument(_) => "invalid_argument",
            ContractError::OutOfRange { .. } => "out_of_range",
            ContractError::Unauthorized { .. } => "unauthorized",
            ContractError::InsufficientFunds { .. } => "insufficient_funds",
            ContractError::Halted => "halted",
        }
    }
}

/// Role a caller must hold for a guarded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Recipient,
    Creator,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Owner => "owner",
            Role::Recipient => "recipient",
            Role::Creator => "entity creator",
        };
        f.write_str(name)
    }
}
