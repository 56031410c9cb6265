//! Append-only entity registry
//!
//! Entities live in an arena indexed by their insertion position. Ids are
//! dense and never reused, so `id < count()` is the existence check.

use crate::core::{Address, ContractError, Role};
use crate::registry::entity::ManagedEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who may mutate an existing entity
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutationPolicy {
    /// Any caller may mutate any entity
    #[default]
    Open,
    /// Only the caller that created an entity may mutate it
    CreatorOnly,
}

/// Stored entity with its immutable identity
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityRecord<E> {
    pub id: usize,
    pub creator: Address,
    pub created_at: DateTime<Utc>,
    pub entity: E,
}

/// Read-only view of one entity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EntityView<S> {
    pub id: usize,
    pub creator: Address,
    pub created_at: DateTime<Utc>,
    pub state: S,
}

/// Emitted when the factory creates an entity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EntityCreated<S> {
    pub id: usize,
    pub creator: Address,
    pub state: S,
    pub timestamp: DateTime<Utc>,
}

/// Emitted after a successful mutation, carrying the new state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EntityChanged<S> {
    pub id: usize,
    pub creator: Address,
    pub created_at: DateTime<Utc>,
    pub caller: Address,
    pub state: S,
    pub timestamp: DateTime<Utc>,
}

/// Registry notifications
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum RegistryEvent<S> {
    EntityCreated(EntityCreated<S>),
    EntityChanged(EntityChanged<S>),
}

impl<S> From<EntityCreated<S>> for RegistryEvent<S> {
    fn from(event: EntityCreated<S>) -> Self {
        RegistryEvent::EntityCreated(event)
    }
}

impl<S> From<EntityChanged<S>> for RegistryEvent<S> {
    fn from(event: EntityChanged<S>) -> Self {
        RegistryEvent::EntityChanged(event)
    }
}

/// Owns and indexes a growable collection of entities
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityRegistry<E> {
    entities: Vec<EntityRecord<E>>,
    #[serde(default)]
    policy: MutationPolicy,
}

impl<E> Default for EntityRegistry<E> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            policy: MutationPolicy::default(),
        }
    }
}

impl<E: ManagedEntity> EntityRegistry<E> {
    /// Create an empty registry where anyone may mutate
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given mutation policy
    pub fn with_policy(policy: MutationPolicy) -> Self {
        Self {
            entities: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> MutationPolicy {
        self.policy
    }

    /// Build a new entity and append it
    ///
    /// Any caller may create. Returns the creation event, whose `id` is the
    /// new entity's index.
    pub fn create(
        &mut self,
        caller: &Address,
        init: E::Init,
    ) -> Result<EntityCreated<E::Snapshot>, ContractError> {
        let entity = E::create(init)?;

        let id = self.entities.len();
        let now = Utc::now();
        let state = entity.snapshot();

        self.entities.push(EntityRecord {
            id,
            creator: caller.clone(),
            created_at: now,
            entity,
        });

        Ok(EntityCreated {
            id,
            creator: caller.clone(),
            state,
            timestamp: now,
        })
    }

    /// Snapshot of one entity
    pub fn get(&self, id: usize) -> Result<EntityView<E::Snapshot>, ContractError> {
        self.record(id).map(Self::view)
    }

    /// Number of entities ever created
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Snapshots of every entity in id order
    pub fn list(&self) -> Vec<EntityView<E::Snapshot>> {
        self.entities.iter().map(Self::view).collect()
    }

    /// Apply a change to an existing entity
    pub fn mutate(
        &mut self,
        caller: &Address,
        id: usize,
        change: E::Change,
    ) -> Result<EntityChanged<E::Snapshot>, ContractError> {
        let policy = self.policy;
        let len = self.entities.len();
        let record = self
            .entities
            .get_mut(id)
            .ok_or(ContractError::OutOfRange { index: id, len })?;

        if policy == MutationPolicy::CreatorOnly && record.creator != *caller {
            return Err(ContractError::Unauthorized {
                caller: caller.clone(),
                required: Role::Creator,
            });
        }

        record.entity.apply(change)?;

        Ok(EntityChanged {
            id,
            creator: record.creator.clone(),
            created_at: record.created_at,
            caller: caller.clone(),
            state: record.entity.snapshot(),
            timestamp: Utc::now(),
        })
    }

    /// Sum of every entity's measure
    pub fn aggregate(&self) -> u128 {
        self.entities
            .iter()
            .fold(0u128, |acc, r| acc.saturating_add(r.entity.measure()))
    }

    /// Check ids and entity invariants of a registry read from storage
    pub fn validate(&self) -> Result<(), String> {
        for (index, record) in self.entities.iter().enumerate() {
            if record.id != index {
                return Err(format!("entity at index {} has id {}", index, record.id));
            }
            record
                .entity
                .validate()
                .map_err(|e| format!("entity {}: {}", index, e))?;
        }
        Ok(())
    }

    fn record(&self, id: usize) -> Result<&EntityRecord<E>, ContractError> {
        self.entities.get(id).ok_or(ContractError::OutOfRange {
            index: id,
            len: self.entities.len(),
        })
    }

    fn view(record: &EntityRecord<E>) -> EntityView<E::Snapshot> {
        EntityView {
            id: record.id,
            creator: record.creator.clone(),
            created_at: record.created_at,
            state: record.entity.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::rectangle::{Rectangle, RectangleChange, RectangleInit};

    fn alice() -> Address {
        Address::new("alice")
    }

    fn bob() -> Address {
        Address::new("bob")
    }

    #[test]
    fn test_create_and_get() {
        let mut registry: EntityRegistry<Rectangle> = EntityRegistry::new();

        let event = registry.create(&alice(), RectangleInit::new(3, 4)).unwrap();
        assert_eq!(event.id, 0);
        assert_eq!(event.creator, alice());
        assert_eq!(event.state.surface, 12);

        let view = registry.get(0).unwrap();
        assert_eq!(view.state.longueur, 3);
        assert_eq!(view.state.largeur, 4);
        assert_eq!(view.state.surface, 12);
        assert_eq!(view.state.perimeter, 14);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_ids_are_dense() {
        let mut registry: EntityRegistry<Rectangle> = EntityRegistry::new();

        for i in 0..5u64 {
            let event = registry
                .create(&alice(), RectangleInit::new(i + 1, 2))
                .unwrap();
            assert_eq!(event.id, i as usize);
        }

        let ids: Vec<usize> = registry.list().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_invalid_create_leaves_registry_unchanged() {
        let mut registry: EntityRegistry<Rectangle> = EntityRegistry::new();

        let result = registry.create(&alice(), RectangleInit::new(0, 5));
        assert!(matches!(result, Err(ContractError::InvalidArgument(_))));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_out_of_range() {
        let mut registry: EntityRegistry<Rectangle> = EntityRegistry::new();

        assert!(matches!(
            registry.get(0),
            Err(ContractError::OutOfRange { index: 0, len: 0 })
        ));
        assert!(matches!(
            registry.mutate(&alice(), 0, RectangleChange::Move { dx: 1, dy: 1 }),
            Err(ContractError::OutOfRange { .. })
        ));

        registry.create(&alice(), RectangleInit::new(1, 1)).unwrap();
        registry.create(&alice(), RectangleInit::new(1, 1)).unwrap();

        assert!(registry.get(1).is_ok());
        assert!(matches!(
            registry.get(2),
            Err(ContractError::OutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            registry.mutate(&alice(), 7, RectangleChange::Move { dx: 1, dy: 1 }),
            Err(ContractError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_mutate_open_policy() {
        let mut registry: EntityRegistry<Rectangle> = EntityRegistry::new();
        registry.create(&alice(), RectangleInit::new(3, 4)).unwrap();

        // Anyone may resize under the open policy
        let event = registry
            .mutate(
                &bob(),
                0,
                RectangleChange::Resize {
                    longueur: 5,
                    largeur: 6,
                },
            )
            .unwrap();

        assert_eq!(event.caller, bob());
        assert_eq!(event.creator, alice());
        assert_eq!(event.state.surface, 30);
        assert_eq!(registry.get(0).unwrap().state.perimeter, 22);
    }

    #[test]
    fn test_mutate_creator_only_policy() {
        let mut registry: EntityRegistry<Rectangle> =
            EntityRegistry::with_policy(MutationPolicy::CreatorOnly);
        registry.create(&alice(), RectangleInit::new(3, 4)).unwrap();

        let result = registry.mutate(&bob(), 0, RectangleChange::Move { dx: 1, dy: 0 });
        assert!(matches!(
            result,
            Err(ContractError::Unauthorized {
                required: Role::Creator,
                ..
            })
        ));
        assert_eq!(registry.get(0).unwrap().state.x, 0);

        registry
            .mutate(&alice(), 0, RectangleChange::Move { dx: 1, dy: 0 })
            .unwrap();
        assert_eq!(registry.get(0).unwrap().state.x, 1);
    }

    #[test]
    fn test_aggregate_total_surface() {
        let mut registry: EntityRegistry<Rectangle> = EntityRegistry::new();
        assert_eq!(registry.aggregate(), 0);

        registry.create(&alice(), RectangleInit::new(3, 4)).unwrap();
        registry.create(&bob(), RectangleInit::new(2, 5)).unwrap();

        assert_eq!(registry.aggregate(), 22);
    }

    #[test]
    fn test_validate() {
        let mut registry: EntityRegistry<Rectangle> = EntityRegistry::new();
        registry.create(&alice(), RectangleInit::new(3, 4)).unwrap();
        registry.create(&bob(), RectangleInit::new(1, 2)).unwrap();
        assert!(registry.validate().is_ok());

        let mut renumbered = registry.clone();
        renumbered.entities[1].id = 0;
        assert!(renumbered.validate().is_err());

        let mut json = serde_json::to_value(&registry).unwrap();
        json["entities"][0]["entity"]["largeur"] = serde_json::json!(0);
        let flattened: EntityRegistry<Rectangle> = serde_json::from_value(json).unwrap();
        assert!(flattened.validate().is_err());
    }

    #[test]
    fn test_registry_serialization() {
        let mut registry: EntityRegistry<Rectangle> =
            EntityRegistry::with_policy(MutationPolicy::CreatorOnly);
        registry.create(&alice(), RectangleInit::new(3, 4)).unwrap();

        let json = serde_json::to_string(&registry).unwrap();
        let restored: EntityRegistry<Rectangle> = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.count(), 1);
        assert_eq!(restored.policy(), MutationPolicy::CreatorOnly);
        assert_eq!(restored.get(0).unwrap(), registry.get(0).unwrap());
    }
}
