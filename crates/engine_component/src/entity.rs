//! Entity identifiers.
//!
//! An [`Entity`] is an opaque 128-bit identifier with no inherent data. IDs
//! are random v4 UUIDs: globally unique and never recycled.

use std::fmt;

use uuid::Uuid;

/// A unique entity identifier.
///
/// Entities are pure identifiers: they carry no data of their own. Components
/// are attached to entities to give them meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(Uuid);

impl Entity {
    /// The nil entity sentinel. Never allocated by [`Entity::generate`].
    pub const NIL: Entity = Entity(Uuid::nil());

    /// Allocates a fresh, globally unique entity ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an entity from a raw 128-bit value.
    #[must_use]
    pub const fn from_u128(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }

    /// Returns the raw 128-bit identifier.
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0.as_u128()
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        self.0
    }

    /// Returns `true` if this is not the nil entity.
    #[must_use]
    pub fn is_valid(self) -> bool {
        !self.0.is_nil()
    }
}

impl From<Uuid> for Entity {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_produces_unique_ids() {
        let ids: HashSet<Entity> = (0..1000).map(|_| Entity::generate()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|e| e.is_valid()));
    }

    #[test]
    fn test_entity_nil() {
        assert!(!Entity::NIL.is_valid());
        assert_eq!(Entity::NIL.as_u128(), 0);
    }

    #[test]
    fn test_from_u128() {
        let e = Entity::from_u128(42);
        assert_eq!(e.as_u128(), 42);
        assert!(e.is_valid());
    }
}
