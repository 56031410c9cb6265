//! Sub-entity contract for the registry
//!
//! A registry does not know what it stores; it only needs a way to build an
//! entity from creation arguments, apply a change, take a snapshot and measure
//! it for aggregation.

use crate::core::ContractError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An entity that can be owned and indexed by an [`EntityRegistry`]
///
/// [`EntityRegistry`]: crate::registry::EntityRegistry
pub trait ManagedEntity: Sized + Clone {
    /// Arguments accepted by the factory operation
    type Init;
    /// Arguments accepted by the mutation operation
    type Change;
    /// Read-only view with every queryable field gathered together
    type Snapshot: Clone + std::fmt::Debug + Serialize + DeserializeOwned;

    /// Build a new entity, rejecting arguments that break its invariants
    fn create(init: Self::Init) -> Result<Self, ContractError>;

    /// Apply a change. Must validate fully before assigning any field.
    fn apply(&mut self, change: Self::Change) -> Result<(), ContractError>;

    /// Re-check the invariants `create` enforces, for entities read back
    /// from storage
    fn validate(&self) -> Result<(), ContractError>;

    fn snapshot(&self) -> Self::Snapshot;

    /// Value folded over the whole collection by `aggregate`
    fn measure(&self) -> u128;
}
