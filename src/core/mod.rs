//! Core types shared by every contract
//!
//! - Caller identities and amounts
//! - The contract error taxonomy

pub mod address;
pub mod decimal;
pub mod error;

pub use address::{parse_amount, Address, Amount, NULL_ADDRESS};
pub use error::{ContractError, Role};
