//! Storage module for contract state persistence

pub mod persistence;

pub use persistence::{
    load_from_file, save_to_file, FileStore, MemoryStore, StateStore, StorageConfig, StorageError,
};
