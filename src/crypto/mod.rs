//! Hashing utilities used for address derivation

pub mod hash;

pub use hash::{sha256, sha256_hex};
