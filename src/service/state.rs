//! Persisted contract state

use crate::core::{Address, ContractError};
use crate::escrow::{EscrowLedger, PayoutJournal};
use crate::registry::{EntityRegistry, MutationPolicy, Rectangle};
use serde::{Deserialize, Serialize};

/// Parameters used when no state has been committed yet
#[derive(Clone, Debug)]
pub struct LedgerSetup {
    pub owner: Address,
    pub recipient: Address,
    pub policy: MutationPolicy,
}

impl LedgerSetup {
    pub fn new(owner: impl Into<Address>, recipient: impl Into<Address>) -> Self {
        Self {
            owner: owner.into(),
            recipient: recipient.into(),
            policy: MutationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MutationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Everything the service commits after a mutation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractState {
    pub registry: EntityRegistry<Rectangle>,
    pub ledger: EscrowLedger,
    #[serde(default)]
    pub payouts: PayoutJournal,
}

impl ContractState {
    /// Fresh state with an open registry
    pub fn new(owner: Address, recipient: Address) -> Result<Self, ContractError> {
        Self::from_setup(&LedgerSetup::new(owner, recipient))
    }

    /// Check registry and ledger invariants
    pub fn validate(&self) -> Result<(), String> {
        self.registry.validate()?;
        self.ledger.validate()
    }

    pub fn from_setup(setup: &LedgerSetup) -> Result<Self, ContractError> {
        Ok(Self {
            registry: EntityRegistry::with_policy(setup.policy),
            ledger: EscrowLedger::new(setup.owner.clone(), setup.recipient.clone())?,
            payouts: PayoutJournal::new(),
        })
    }
}
