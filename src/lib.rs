//! Escrow-registry: a rectangle registry and an escrow ledger in Rust
//!
//! This crate provides two small contracts behind one serialized service:
//! - A managed-entity registry (rectangles) with dense ids and aggregation
//! - An escrow ledger pooling deposits for a single authorized recipient
//! - Owner-controlled recipient changes and a halt flag
//! - Sequenced notifications with live broadcast
//! - JSON persistence with atomic commits and rotating backups
//!
//! # Example
//!
//! ```rust
//! use escrow_registry::registry::RectangleInit;
//! use escrow_registry::service::{ContractService, LedgerSetup};
//! use escrow_registry::storage::MemoryStore;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let setup = LedgerSetup::new("owner", "recipient");
//!     let service = ContractService::open(MemoryStore::new(), &setup).unwrap();
//!
//!     service.create_rectangle(&"alice".into(), RectangleInit::new(3, 4)).await.unwrap();
//!     service.deposit(&"alice".into(), 100).await.unwrap();
//!
//!     let withdrawn = service.withdraw(&"recipient".into()).await.unwrap();
//!     assert_eq!(withdrawn.amount, 100);
//!     assert_eq!(service.total_surface().await, 12);
//! });
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod escrow;
pub mod events;
pub mod registry;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use core::{Address, Amount, ContractError, Role};
pub use escrow::{EscrowLedger, LedgerEvent, LedgerStats, Payout, PayoutJournal};
pub use events::{Event, EventBus, Notification, NotificationLog};
pub use registry::{EntityRegistry, ManagedEntity, MutationPolicy, Rectangle, RectangleInit};
pub use service::{ContractService, LedgerSetup, ServiceError};
pub use storage::{FileStore, MemoryStore, StateStore, StorageConfig};
