//! Contract state persistence
//!
//! Every successful mutation ends with a [`StateStore::commit`] of the full
//! contract state.

use crate::service::ContractState;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Data directory {0:?} is already in use by another process")]
    Locked(PathBuf),
}

/// Backend holding the committed contract state
pub trait StateStore: Send + Sync {
    /// Last committed state, if any
    fn load(&self) -> Result<Option<ContractState>, StorageError>;

    /// Durably record `state` as the latest committed state
    fn commit(&self, state: &ContractState) -> Result<(), StorageError>;
}

impl<T: StateStore + ?Sized> StateStore for Box<T> {
    fn load(&self) -> Result<Option<ContractState>, StorageError> {
        (**self).load()
    }

    fn commit(&self, state: &ContractState) -> Result<(), StorageError> {
        (**self).commit(state)
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".escrow_data"),
            state_file: "state.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Name of the lock file held in the data directory
const LOCK_FILE: &str = ".lock";

/// JSON file store with rotating backups
///
/// Holds an exclusive lock on its data directory until dropped, so only one
/// process commits to a given state file at a time.
#[derive(Debug)]
pub struct FileStore {
    config: StorageConfig,
    _lock_file: fs::File,
}

impl FileStore {
    /// Create the data directory if needed and lock it
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;

        let lock_file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(config.data_dir.join(LOCK_FILE))?;
        fs2::FileExt::try_lock_exclusive(&lock_file)
            .map_err(|_| StorageError::Locked(config.data_dir.clone()))?;

        Ok(Self {
            config,
            _lock_file: lock_file,
        })
    }

    /// Store rooted at `data_dir` with default settings
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::new(StorageConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        })
    }

    pub fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.state_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.state_file, index))
    }

    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    /// Rotate backup files, dropping the oldest
    fn rotate_backups(&self) -> Result<(), StorageError> {
        if self.config.max_backups == 0 {
            return Ok(());
        }

        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Available backup indices, newest first
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Load the state stored in a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<ContractState, StorageError> {
        let path = self.backup_path(backup_index);
        if !path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }
        load_from_file(&path)
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<Option<ContractState>, StorageError> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(None);
        }
        load_from_file(&path).map(Some)
    }

    fn commit(&self, state: &ContractState) -> Result<(), StorageError> {
        let path = self.state_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to a temporary file, then rename over the old state
        let temp_path = self.config.data_dir.join(format!("{}.tmp", self.config.state_file));
        save_to_file(state, &temp_path)?;
        fs::rename(&temp_path, &path)?;

        log::debug!("Committed contract state to {:?}", path);
        Ok(())
    }
}

/// Store keeping the last committed state in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: Mutex<Option<ContractState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest committed state
    pub fn snapshot(&self) -> Option<ContractState> {
        self.committed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(None)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<ContractState>, StorageError> {
        let guard = self
            .committed
            .lock()
            .map_err(|_| StorageError::InvalidData("memory store lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn commit(&self, state: &ContractState) -> Result<(), StorageError> {
        let mut guard = self
            .committed
            .lock()
            .map_err(|_| StorageError::InvalidData("memory store lock poisoned".to_string()))?;
        *guard = Some(state.clone());
        Ok(())
    }
}

/// Save contract state to a specific file path
pub fn save_to_file(state: &ContractState, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, state)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Load contract state from a specific file path
pub fn load_from_file(path: &Path) -> Result<ContractState, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let state: ContractState = serde_json::from_reader(reader)?;

    // Refuse state that could not have been produced by valid operations
    state.validate().map_err(StorageError::InvalidData)?;

    Ok(state)
}
