//! Managed-entity registry
//!
//! A factory-backed collection of independently addressable entities:
//! - Dense, zero-based ids assigned in creation order
//! - Per-entity snapshot queries and bulk listing
//! - Mutation under a configurable policy
//! - Aggregation over the whole collection
//!
//! # Example
//!
//! ```rust
//! use escrow_registry::core::Address;
//! use escrow_registry::registry::{EntityRegistry, Rectangle, RectangleInit};
//!
//! let mut registry: EntityRegistry<Rectangle> = EntityRegistry::new();
//! let created = registry.create(&Address::new("alice"), RectangleInit::new(3, 4)).unwrap();
//!
//! let view = registry.get(created.id).unwrap();
//! assert_eq!(view.state.surface, 12);
//! assert_eq!(view.state.perimeter, 14);
//! ```

pub mod entity;
pub mod rectangle;
pub mod registry;

pub use entity::ManagedEntity;
pub use rectangle::{Rectangle, RectangleChange, RectangleInit, RectangleSnapshot, Shape};
pub use registry::{
    EntityChanged, EntityCreated, EntityRecord, EntityRegistry, EntityView, MutationPolicy,
    RegistryEvent,
};
