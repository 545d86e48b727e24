//! Immutable component sets.
//!
//! A [`ComponentSet`] is the value an entity owns: at most one component per
//! runtime type, plus the matching [`TypeSet`]. Both views are derived from
//! the same map in a single constructor, so the type set always describes
//! exactly the values present. Every "mutation" returns a new set and leaves
//! the original untouched, which makes a set safe to hand out as a snapshot.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::component::{Component, ComponentInfo, ComponentTypeId, GenericTypeId};
use crate::error::ComponentError;
use crate::query::TypeFilter;

trait ErasedComponent: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Component> ErasedComponent for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A type-erased component value together with its type metadata.
///
/// Cloning is cheap: the value is reference counted and never mutated.
#[derive(Clone)]
pub struct StoredComponent {
    info: ComponentInfo,
    value: Arc<dyn ErasedComponent>,
}

impl StoredComponent {
    /// Wrap a component value.
    #[must_use]
    pub fn new<T: Component>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an already shared component value.
    #[must_use]
    pub fn from_arc<T: Component>(value: Arc<T>) -> Self {
        Self {
            info: T::info(),
            value,
        }
    }

    /// Returns the component's type metadata.
    #[must_use]
    pub fn info(&self) -> ComponentInfo {
        self.info
    }

    /// Returns the closed type identifier.
    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        self.info.type_id
    }

    /// Borrow the value as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }

    /// Get a shared handle to the value as `T`, if it is one.
    #[must_use]
    pub fn downcast<T: Component>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).into_any().downcast::<T>().ok()
    }
}

impl fmt::Debug for StoredComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}

/// An ordered list of components used to create an entity.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    components: Vec<StoredComponent>,
}

impl Bundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component.
    #[must_use]
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.components.push(StoredComponent::new(value));
        self
    }

    /// Append an already wrapped component.
    #[must_use]
    pub fn with_stored(mut self, component: StoredComponent) -> Self {
        self.components.push(component);
        self
    }

    /// Returns the number of components in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the bundle is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl FromIterator<StoredComponent> for Bundle {
    fn from_iter<I: IntoIterator<Item = StoredComponent>>(iter: I) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}

/// The set of runtime types present on an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet {
    closed: BTreeSet<ComponentTypeId>,
    /// Open identity → number of closed instantiations present.
    open: BTreeMap<GenericTypeId, usize>,
}

impl TypeSet {
    fn from_components<'a>(components: impl Iterator<Item = &'a StoredComponent>) -> Self {
        let mut set = Self::default();
        for component in components {
            let info = component.info();
            set.closed.insert(info.type_id);
            if let Some(generic) = info.generic {
                *set.open.entry(generic).or_default() += 1;
            }
        }
        set
    }

    /// Returns `true` if the closed type is present.
    #[must_use]
    pub fn contains(&self, type_id: ComponentTypeId) -> bool {
        self.closed.contains(&type_id)
    }

    /// Returns `true` if any instantiation of the open type is present.
    #[must_use]
    pub fn contains_open(&self, generic: GenericTypeId) -> bool {
        self.open.contains_key(&generic)
    }

    /// Returns `true` if this set satisfies `filter`.
    #[must_use]
    pub fn matches(&self, filter: &TypeFilter) -> bool {
        match filter {
            TypeFilter::Exact(id) => self.contains(*id),
            TypeFilter::Open(generic) => self.contains_open(*generic),
        }
    }

    /// Returns `true` if this set satisfies every filter.
    #[must_use]
    pub fn matches_all(&self, filters: &[TypeFilter]) -> bool {
        filters.iter().all(|f| self.matches(f))
    }

    /// Iterate the closed type identifiers in order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.closed.iter().copied()
    }

    /// Iterate the open identities present.
    pub fn generics(&self) -> impl Iterator<Item = GenericTypeId> + '_ {
        self.open.keys().copied()
    }

    /// Returns the number of closed types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.closed.len()
    }

    /// Returns `true` if no types are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty()
    }
}

/// An immutable set of components, unique by runtime type.
#[derive(Clone, Default)]
pub struct ComponentSet {
    components: BTreeMap<ComponentTypeId, StoredComponent>,
    types: TypeSet,
}

impl ComponentSet {
    fn from_map(components: BTreeMap<ComponentTypeId, StoredComponent>) -> Self {
        let types = TypeSet::from_components(components.values());
        Self { components, types }
    }

    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a bundle.
    ///
    /// # Errors
    ///
    /// - [`ComponentError::Duplicate`] if the bundle holds two components of
    ///   the same type.
    /// - [`ComponentError::TypeCollision`] if two different types in the
    ///   bundle share a type identifier.
    pub fn from_bundle(bundle: Bundle) -> Result<Self, ComponentError> {
        let mut components: BTreeMap<ComponentTypeId, StoredComponent> = BTreeMap::new();
        for component in bundle.components {
            let info = component.info();
            if let Some(existing) = components.get(&info.type_id) {
                return Err(conflict(existing.info(), info));
            }
            components.insert(info.type_id, component);
        }
        Ok(Self::from_map(components))
    }

    /// Returns a new set with `component` added.
    ///
    /// # Errors
    ///
    /// - [`ComponentError::Duplicate`] if the type is already present.
    /// - [`ComponentError::TypeCollision`] if a different type with the same
    ///   identifier is present.
    pub fn inserted(&self, component: StoredComponent) -> Result<Self, ComponentError> {
        let info = component.info();
        if let Some(existing) = self.components.get(&info.type_id) {
            return Err(conflict(existing.info(), info));
        }
        let mut components = self.components.clone();
        components.insert(info.type_id, component);
        Ok(Self::from_map(components))
    }

    /// Returns a new set with `component` in place of any existing component
    /// of the same type, along with the replaced component.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::TypeCollision`] if the slot holds a
    /// different type with the same identifier. That value is never
    /// overwritten.
    pub fn replaced(
        &self,
        component: StoredComponent,
    ) -> Result<(Self, Option<StoredComponent>), ComponentError> {
        self.check_type(component.info())?;
        let mut components = self.components.clone();
        let previous = components.insert(component.type_id(), component);
        Ok((Self::from_map(components), previous))
    }

    /// Check that whatever this set holds under `info.type_id` is the same
    /// Rust type as `info`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::TypeCollision`] otherwise.
    pub fn check_type(&self, info: ComponentInfo) -> Result<(), ComponentError> {
        match self.components.get(&info.type_id) {
            Some(existing) if existing.info().collides_with(&info) => {
                Err(ComponentError::TypeCollision(info.name))
            }
            _ => Ok(()),
        }
    }

    /// Returns a new set without the given type, or `None` if it was absent.
    #[must_use]
    pub fn removed(&self, type_id: ComponentTypeId) -> Option<(Self, StoredComponent)> {
        if !self.components.contains_key(&type_id) {
            return None;
        }
        let mut components = self.components.clone();
        let removed = components.remove(&type_id)?;
        Some((Self::from_map(components), removed))
    }

    /// Returns a new set without every component matching `predicate`, along
    /// with the removed components.
    #[must_use]
    pub fn removed_where<F>(&self, mut predicate: F) -> (Self, Vec<StoredComponent>)
    where
        F: FnMut(&StoredComponent) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .components
            .iter()
            .map(|(id, c)| (*id, c.clone()))
            .partition(|(_, c)| predicate(c));
        let removed = removed.into_iter().map(|(_, c)| c).collect();
        (Self::from_map(kept.into_iter().collect()), removed)
    }

    /// Borrow the component of type `T`, if present.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components
            .get(&T::component_type_id())
            .and_then(StoredComponent::downcast_ref::<T>)
    }

    /// Get a shared handle to the component of type `T`, if present.
    #[must_use]
    pub fn get_arc<T: Component>(&self) -> Option<Arc<T>> {
        self.components
            .get(&T::component_type_id())
            .and_then(StoredComponent::downcast::<T>)
    }

    /// Borrow the component of type `T`, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Missing`] if the set has no `T`.
    pub fn require<T: Component>(&self) -> Result<&T, ComponentError> {
        self.get::<T>()
            .ok_or_else(|| ComponentError::Missing(T::type_name()))
    }

    /// Returns `true` if a component of type `T` is present.
    #[must_use]
    pub fn contains<T: Component>(&self) -> bool {
        self.types.contains(T::component_type_id())
    }

    /// Look up a component by closed type identifier.
    #[must_use]
    pub fn get_stored(&self, type_id: ComponentTypeId) -> Option<&StoredComponent> {
        self.components.get(&type_id)
    }

    /// Iterate every component instantiating the open type `generic`.
    pub fn instances_of(
        &self,
        generic: GenericTypeId,
    ) -> impl Iterator<Item = &StoredComponent> + '_ {
        self.components
            .values()
            .filter(move |c| c.info().is_instance_of(generic))
    }

    /// Iterate all components in type-id order.
    pub fn iter(&self) -> impl Iterator<Item = &StoredComponent> + '_ {
        self.components.values()
    }

    /// The runtime types present in this set.
    #[must_use]
    pub fn types(&self) -> &TypeSet {
        &self.types
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the set has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.components.values()).finish()
    }
}

fn conflict(existing: ComponentInfo, incoming: ComponentInfo) -> ComponentError {
    if existing.collides_with(&incoming) {
        ComponentError::TypeCollision(incoming.name)
    } else {
        ComponentError::Duplicate(incoming.name)
    }
}
