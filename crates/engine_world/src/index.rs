//! Component-type index.
//!
//! Maps each component type (closed, and open for generic instantiations) to
//! the set of entities currently holding it. The index is bookkeeping only:
//! the store updates it while holding the owning entity's lock, and readers
//! treat it as a candidate list to be confirmed against the entity snapshot.

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use engine_component::{ComponentInfo, ComponentSet, ComponentTypeId, Entity, GenericTypeId, TypeFilter};

/// Entity sets keyed by component type.
///
/// Only the owning [`EntityStore`](crate::EntityStore) writes to the index.
/// Outside this crate it is read-only:
///
/// ```rust,compile_fail
/// use engine_component::{Bundle, Component, Entity};
/// use engine_world::EntityStore;
///
/// #[derive(Debug)]
/// struct Pos;
/// impl Component for Pos {}
///
/// let store = EntityStore::new();
/// let e = store.create(Bundle::new().with(Pos)).unwrap();
/// store.index().remove(e, Pos::info());
/// ```
#[derive(Debug, Default)]
pub struct ComponentIndex {
    by_type: DashMap<ComponentTypeId, HashSet<Entity>>,
    /// Open identity → entity → number of instantiations the entity holds.
    by_generic: DashMap<GenericTypeId, HashMap<Entity, usize>>,
}

impl ComponentIndex {
    /// Record that `entity` holds a component of type `info`.
    pub(crate) fn insert(&self, entity: Entity, info: ComponentInfo) {
        self.by_type.entry(info.type_id).or_default().insert(entity);
        if let Some(generic) = info.generic {
            *self
                .by_generic
                .entry(generic)
                .or_default()
                .entry(entity)
                .or_default() += 1;
        }
    }

    /// Record that `entity` no longer holds a component of type `info`.
    pub(crate) fn remove(&self, entity: Entity, info: ComponentInfo) {
        if let Some(mut set) = self.by_type.get_mut(&info.type_id) {
            set.remove(&entity);
        }
        self.by_type.remove_if(&info.type_id, |_, set| set.is_empty());

        let Some(generic) = info.generic else {
            return;
        };
        if let Some(mut holders) = self.by_generic.get_mut(&generic) {
            if let Some(count) = holders.get_mut(&entity) {
                *count -= 1;
                if *count == 0 {
                    holders.remove(&entity);
                }
            }
        }
        self.by_generic
            .remove_if(&generic, |_, holders| holders.is_empty());
    }

    /// Index every component of a newly created entity.
    pub(crate) fn insert_all(&self, entity: Entity, components: &ComponentSet) {
        for component in components.iter() {
            self.insert(entity, component.info());
        }
    }

    /// Drop every index entry of a destroyed entity.
    pub(crate) fn remove_all(&self, entity: Entity, components: &ComponentSet) {
        for component in components.iter() {
            self.remove(entity, component.info());
        }
    }

    /// Apply the difference between two versions of an entity's components.
    pub(crate) fn update(&self, entity: Entity, before: &ComponentSet, after: &ComponentSet) {
        for component in before.iter() {
            if after.get_stored(component.type_id()).is_none() {
                self.remove(entity, component.info());
            }
        }
        for component in after.iter() {
            if before.get_stored(component.type_id()).is_none() {
                self.insert(entity, component.info());
            }
        }
    }

    /// Snapshot of the entities matching a single filter.
    #[must_use]
    pub fn entities_with(&self, filter: &TypeFilter) -> Vec<Entity> {
        match filter {
            TypeFilter::Exact(id) => self
                .by_type
                .get(id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default(),
            TypeFilter::Open(generic) => self
                .by_generic
                .get(generic)
                .map(|holders| holders.keys().copied().collect())
                .unwrap_or_default(),
        }
    }

    /// Number of entities matching a single filter.
    #[must_use]
    pub fn count(&self, filter: &TypeFilter) -> usize {
        match filter {
            TypeFilter::Exact(id) => self.by_type.get(id).map_or(0, |set| set.len()),
            TypeFilter::Open(generic) => self.by_generic.get(generic).map_or(0, |h| h.len()),
        }
    }

    /// Candidate entities for a conjunction of filters: the holders of the
    /// most selective filter. Returns `None` when there are no filters.
    #[must_use]
    pub fn candidates(&self, filters: &[TypeFilter]) -> Option<Vec<Entity>> {
        let narrowest = filters.iter().min_by_key(|f| self.count(f))?;
        Some(self.entities_with(narrowest))
    }
}
