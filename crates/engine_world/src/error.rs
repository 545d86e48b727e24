//! Entity store error types.

use engine_component::{ComponentError, Entity};

/// Errors returned by [`EntityStore`](crate::EntityStore) operations.
///
/// Every variant is a programmer error: the caller acted on an entity or
/// component state that does not exist. Expected absence is reported through
/// `Option` / `bool` results instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The entity was never created, or has been destroyed.
    #[error("unknown entity {0}")]
    UnknownEntity(Entity),

    /// The nil id was supplied; it never names an entity.
    #[error("the nil entity id cannot be used")]
    NilEntity,

    /// An explicit id was supplied that is already live.
    #[error("entity {0} already exists")]
    AlreadyExists(Entity),

    /// An explicit id was supplied that belongs to a destroyed entity.
    #[error("entity {0} was destroyed and cannot be recreated")]
    Resurrected(Entity),

    /// `add_component` was called for a type the entity already holds.
    #[error("entity {entity} already has component {component}; use replace_component")]
    DuplicateComponent {
        /// The entity being modified.
        entity: Entity,
        /// The component type name.
        component: &'static str,
    },

    /// The component set passed to the store was invalid.
    #[error(transparent)]
    Component(#[from] ComponentError),
}
