//! Serialized access to the contracts
//!
//! All mutations go through one write lock and run
//! validate, mutate, commit, publish in that order. Readers share the lock
//! and never observe a mutation that has not been committed.

use crate::core::{Address, Amount, ContractError};
use crate::escrow::{
    Deposited, Depositor, HaltChanged, LedgerEvent, LedgerStats, PayoutRecord, RecipientChanged,
    Withdrawn,
};
use crate::events::{Event, EventBus, Notification, NotificationLog};
use crate::registry::{
    EntityChanged, EntityCreated, EntityView, RectangleChange, RectangleInit, RectangleSnapshot,
    RegistryEvent,
};
use crate::service::state::{ContractState, LedgerSetup};
use crate::storage::{StateStore, StorageError};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

/// Service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("No contract state found; run `init` first")]
    NotInitialized,
}

impl ServiceError {
    /// Stable machine-readable tag for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Contract(e) => e.kind(),
            ServiceError::Storage(_) => "storage",
            ServiceError::NotInitialized => "not_initialized",
        }
    }

    /// The contract error, if this is one
    pub fn contract_error(&self) -> Option<&ContractError> {
        match self {
            ServiceError::Contract(e) => Some(e),
            _ => None,
        }
    }
}

struct Inner {
    state: ContractState,
    log: NotificationLog,
}

/// Registry and ledger behind a single serialization point
pub struct ContractService<S: StateStore> {
    inner: RwLock<Inner>,
    store: S,
    bus: EventBus,
}

impl<S: StateStore> ContractService<S> {
    /// Load committed state, or create it from `setup` and commit it
    pub fn open(store: S, setup: &LedgerSetup) -> Result<Self, ServiceError> {
        let state = match store.load()? {
            Some(state) => {
                log::info!("Loaded contract state (ledger {})", state.ledger.address());
                state
            }
            None => {
                let state = ContractState::from_setup(setup)?;
                store.commit(&state)?;
                log::info!("Initialized contract state (ledger {})", state.ledger.address());
                state
            }
        };

        Ok(Self::with_state(store, state))
    }

    /// Load committed state, failing if none exists
    pub fn open_existing(store: S) -> Result<Self, ServiceError> {
        let state = store.load()?.ok_or(ServiceError::NotInitialized)?;
        Ok(Self::with_state(store, state))
    }

    fn with_state(store: S, state: ContractState) -> Self {
        Self {
            inner: RwLock::new(Inner {
                state,
                log: NotificationLog::new(),
            }),
            store,
            bus: EventBus::new(),
        }
    }

    /// Run one mutation to completion or not at all
    async fn execute<T, F>(&self, operation: &str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut ContractState) -> Result<(T, Event), ContractError>,
    {
        let mut inner = self.inner.write().await;
        let previous = inner.state.clone();

        let (output, event) = match f(&mut inner.state) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("{} rejected: {}", operation, e);
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.commit(&inner.state) {
            log::error!("{} could not be committed: {}", operation, e);
            inner.state = previous;
            return Err(e.into());
        }

        let notification = inner.log.append(event);
        log::info!(
            "{} committed: {} (seq {})",
            operation,
            notification.event.name(),
            notification.sequence
        );
        self.bus.publish(notification);

        Ok(output)
    }

    // =========================================================================
    // Registry
    // =========================================================================

    pub async fn create_rectangle(
        &self,
        caller: &Address,
        init: RectangleInit,
    ) -> Result<EntityCreated<RectangleSnapshot>, ServiceError> {
        self.execute("create", |state| {
            let created = state.registry.create(caller, init)?;
            Ok((created.clone(), RegistryEvent::from(created).into()))
        })
        .await
    }

    pub async fn mutate_rectangle(
        &self,
        caller: &Address,
        id: usize,
        change: RectangleChange,
    ) -> Result<EntityChanged<RectangleSnapshot>, ServiceError> {
        self.execute("mutate", |state| {
            let changed = state.registry.mutate(caller, id, change)?;
            Ok((changed.clone(), RegistryEvent::from(changed).into()))
        })
        .await
    }

    pub async fn resize_rectangle(
        &self,
        caller: &Address,
        id: usize,
        longueur: u64,
        largeur: u64,
    ) -> Result<EntityChanged<RectangleSnapshot>, ServiceError> {
        self.mutate_rectangle(caller, id, RectangleChange::Resize { longueur, largeur })
            .await
    }

    pub async fn move_rectangle(
        &self,
        caller: &Address,
        id: usize,
        dx: i64,
        dy: i64,
    ) -> Result<EntityChanged<RectangleSnapshot>, ServiceError> {
        self.mutate_rectangle(caller, id, RectangleChange::Move { dx, dy })
            .await
    }

    pub async fn get_rectangle(
        &self,
        id: usize,
    ) -> Result<EntityView<RectangleSnapshot>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner.state.registry.get(id)?)
    }

    pub async fn rectangle_count(&self) -> usize {
        self.inner.read().await.state.registry.count()
    }

    pub async fn list_rectangles(&self) -> Vec<EntityView<RectangleSnapshot>> {
        self.inner.read().await.state.registry.list()
    }

    /// Sum of all rectangle surfaces
    pub async fn total_surface(&self) -> u128 {
        self.inner.read().await.state.registry.aggregate()
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    pub async fn deposit(&self, caller: &Address, amount: Amount) -> Result<Deposited, ServiceError> {
        self.execute("deposit", |state| {
            let deposited = state.ledger.deposit(caller, amount)?;
            Ok((deposited.clone(), LedgerEvent::from(deposited).into()))
        })
        .await
    }

    pub async fn withdraw(&self, caller: &Address) -> Result<Withdrawn, ServiceError> {
        self.execute("withdraw", |state| {
            let withdrawn = state.ledger.withdraw(caller, &mut state.payouts)?;
            Ok((withdrawn.clone(), LedgerEvent::from(withdrawn).into()))
        })
        .await
    }

    pub async fn withdraw_amount(
        &self,
        caller: &Address,
        amount: Amount,
    ) -> Result<Withdrawn, ServiceError> {
        self.execute("withdraw", |state| {
            let withdrawn = state
                .ledger
                .withdraw_amount(caller, amount, &mut state.payouts)?;
            Ok((withdrawn.clone(), LedgerEvent::from(withdrawn).into()))
        })
        .await
    }

    pub async fn change_recipient(
        &self,
        caller: &Address,
        new_recipient: Address,
    ) -> Result<RecipientChanged, ServiceError> {
        self.execute("change_recipient", |state| {
            let changed = state.ledger.change_recipient(caller, new_recipient)?;
            Ok((changed.clone(), LedgerEvent::from(changed).into()))
        })
        .await
    }

    pub async fn halt(&self, caller: &Address) -> Result<HaltChanged, ServiceError> {
        self.execute("halt", |state| {
            let changed = state.ledger.halt(caller)?;
            Ok((changed.clone(), LedgerEvent::from(changed).into()))
        })
        .await
    }

    pub async fn resume(&self, caller: &Address) -> Result<HaltChanged, ServiceError> {
        self.execute("resume", |state| {
            let changed = state.ledger.resume(caller)?;
            Ok((changed.clone(), LedgerEvent::from(changed).into()))
        })
        .await
    }

    pub async fn stats(&self) -> LedgerStats {
        self.inner.read().await.state.ledger.get_stats()
    }

    pub async fn get_depositor(&self, index: usize) -> Result<Depositor, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner.state.ledger.get_depositor(index)?)
    }

    pub async fn depositors(&self) -> Vec<Depositor> {
        self.inner.read().await.state.ledger.depositors()
    }

    pub async fn contribution_of(&self, address: &Address) -> Amount {
        self.inner.read().await.state.ledger.contribution_of(address)
    }

    /// Transfers executed by withdrawals
    pub async fn payouts(&self) -> Vec<PayoutRecord> {
        self.inner.read().await.state.payouts.records().to_vec()
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Retained notifications with `sequence >= from`
    pub async fn notifications_since(&self, from: u64) -> Vec<Notification> {
        self.inner.read().await.log.since(from)
    }

    /// Sequence number the next notification will receive
    pub async fn next_sequence(&self) -> u64 {
        self.inner.read().await.log.next_sequence()
    }

    /// Live stream of committed notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.bus.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Copy of the full in-memory state
    pub async fn snapshot(&self) -> ContractState {
        self.inner.read().await.state.clone()
    }
}
