//! Query descriptors for system data access declarations.
//!
//! A [`QueryDescriptor`] declares which component types an entity must hold
//! for a system to be interested in it. Each requirement is a
//! [`TypeFilter`]: either a concrete type or the open form of a generic type,
//! which matches every closed instantiation.

use crate::component::{Component, ComponentTypeId, GenericTypeId};

/// A single component-type requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFilter {
    /// Match entities holding exactly this closed type.
    Exact(ComponentTypeId),
    /// Match entities holding any instantiation of this generic type.
    Open(GenericTypeId),
}

impl TypeFilter {
    /// A filter for the concrete type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::Exact(T::component_type_id())
    }
}

impl From<ComponentTypeId> for TypeFilter {
    fn from(id: ComponentTypeId) -> Self {
        Self::Exact(id)
    }
}

impl From<GenericTypeId> for TypeFilter {
    fn from(id: GenericTypeId) -> Self {
        Self::Open(id)
    }
}

/// Describes the component requirements of a query or system.
///
/// An entity matches when its type set is a superset of every requirement.
/// An empty descriptor matches every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDescriptor {
    required: Vec<TypeFilter>,
}

impl QueryDescriptor {
    /// Create a new empty query descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the concrete component type `T`.
    #[must_use]
    pub fn with<T: Component>(self) -> Self {
        self.require(TypeFilter::of::<T>())
    }

    /// Require any instantiation of the open generic type.
    #[must_use]
    pub fn with_open(self, generic: GenericTypeId) -> Self {
        self.require(TypeFilter::Open(generic))
    }

    /// Add a requirement. Repeated requirements are ignored.
    #[must_use]
    pub fn require(mut self, filter: impl Into<TypeFilter>) -> Self {
        let filter = filter.into();
        if !self.required.contains(&filter) {
            self.required.push(filter);
        }
        self
    }

    /// Returns the required filters, in declaration order.
    #[must_use]
    pub fn required(&self) -> &[TypeFilter] {
        &self.required
    }

    /// Returns `true` if the descriptor has no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

impl FromIterator<TypeFilter> for QueryDescriptor {
    fn from_iter<I: IntoIterator<Item = TypeFilter>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::require)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Transform;
    impl Component for Transform {}

    #[derive(Debug)]
    struct Velocity;
    impl Component for Velocity {}

    #[test]
    fn test_builder_collects_requirements() {
        let ability = GenericTypeId::from_name("Ability");
        let q = QueryDescriptor::new()
            .with::<Transform>()
            .with::<Velocity>()
            .with_open(ability);

        assert_eq!(
            q.required(),
            &[
                TypeFilter::of::<Transform>(),
                TypeFilter::of::<Velocity>(),
                TypeFilter::Open(ability),
            ]
        );
    }

    #[test]
    fn test_duplicate_requirements_ignored() {
        let q = QueryDescriptor::new()
            .with::<Transform>()
            .with::<Transform>();
        assert_eq!(q.required().len(), 1);
    }

    #[test]
    fn test_from_iterator() {
        let q: QueryDescriptor = [
            TypeFilter::of::<Transform>(),
            TypeFilter::of::<Transform>(),
            TypeFilter::of::<Velocity>(),
        ]
        .into_iter()
        .collect();
        assert_eq!(q.required().len(), 2);
        assert!(!q.is_empty());
        assert!(QueryDescriptor::new().is_empty());
    }
}
