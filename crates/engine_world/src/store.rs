//! The concurrent entity store.
//!
//! [`EntityStore`] owns the canonical mapping from [`Entity`] to its
//! immutable [`ComponentSet`] snapshot. Storage is sharded (`dashmap`), so
//! operations on unrelated entities proceed in parallel while operations on
//! the same entity serialize on its shard lock.
//!
//! ## Atomicity
//!
//! Every mutation replaces the entity's snapshot and updates the
//! [`ComponentIndex`] while holding the entity's write lock. Queries read
//! candidates from the index and confirm each one against the entity's
//! snapshot, so a reader never sees a value without its index entry or the
//! other way round.
//!
//! Lock order is always entity shard → index shard. Callbacks passed to the
//! store (predicates) run under the entity lock and must not call back into
//! the store.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use engine_component::{
    Bundle, Component, ComponentError, ComponentInfo, ComponentSet, ComponentTypeId, Entity,
    QueryDescriptor, StoredComponent,
};
use tracing::trace;

use crate::error::StoreError;
use crate::index::ComponentIndex;

/// A point-in-time query result.
///
/// Holds the matching entities together with the snapshot each one had when
/// the query ran. Entities created or destroyed afterwards are not reflected.
/// The result can be iterated any number of times.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    rows: Vec<(Entity, Arc<ComponentSet>)>,
}

impl QueryResult {
    /// Iterate the matching rows.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &ComponentSet)> + '_ {
        self.rows.iter().map(|(e, set)| (*e, &**set))
    }

    /// Iterate the matching entity ids.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.rows.iter().map(|(e, _)| *e)
    }

    /// Returns `true` if `entity` is part of the result.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.rows.iter().any(|(e, _)| *e == entity)
    }

    /// Returns the number of matching entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for QueryResult {
    type Item = (Entity, Arc<ComponentSet>);
    type IntoIter = std::vec::IntoIter<(Entity, Arc<ComponentSet>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// The canonical entity/component store.
///
/// Shared between systems as an `Arc<EntityStore>`; every method takes
/// `&self` and is safe to call from any thread.
///
/// ## Memory
///
/// Every destroyed id is kept as a tombstone for the lifetime of the store,
/// one `Entity` (16 bytes plus map overhead) per destroy, so that
/// [`EntityStore::create_with_id`] can never bring an id back. A process that
/// churns through entities grows accordingly; [`EntityStore::tombstones`]
/// reports the current count.
///
/// ## Type identity
///
/// The first type stored under a [`ComponentTypeId`] claims it. Storing a
/// different Rust type that reports the same name fails with
/// [`ComponentError::TypeCollision`], so queries by id never mix types.
#[derive(Debug, Default)]
pub struct EntityStore {
    /// Live entities and their current snapshot.
    entities: DashMap<Entity, Arc<ComponentSet>>,
    /// Component type → holders.
    index: ComponentIndex,
    /// Ids that have been destroyed and must never resolve again.
    destroyed: DashSet<Entity>,
    /// The Rust type that owns each component id.
    claimed: DashMap<ComponentTypeId, ComponentInfo>,
}

impl EntityStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity with a freshly allocated id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Component`] if the bundle holds two components
    /// of the same type, or a type whose id is claimed by another type.
    pub fn create(&self, bundle: Bundle) -> Result<Entity, StoreError> {
        self.create_with_id(Entity::generate(), bundle)
    }

    /// Create an entity under a caller-supplied id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NilEntity`] for [`Entity::NIL`].
    /// - [`StoreError::AlreadyExists`] if the id is live.
    /// - [`StoreError::Resurrected`] if the id was destroyed.
    /// - [`StoreError::Component`] if the bundle holds duplicate or
    ///   colliding types.
    pub fn create_with_id(&self, entity: Entity, bundle: Bundle) -> Result<Entity, StoreError> {
        if !entity.is_valid() {
            return Err(StoreError::NilEntity);
        }
        let components = ComponentSet::from_bundle(bundle)?;
        for component in components.iter() {
            self.claim(component.info())?;
        }
        match self.entities.entry(entity) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(entity)),
            Entry::Vacant(slot) => {
                // Checked under the shard lock: `destroy` records tombstones
                // while holding the same lock.
                if self.destroyed.contains(&entity) {
                    return Err(StoreError::Resurrected(entity));
                }
                self.index.insert_all(entity, &components);
                trace!(%entity, components = components.len(), "entity created");
                slot.insert(Arc::new(components));
                Ok(entity)
            }
        }
    }

    /// Destroy an entity, returning its final snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownEntity`] if the entity is not live,
    /// including when it has already been destroyed.
    pub fn destroy(&self, entity: Entity) -> Result<Arc<ComponentSet>, StoreError> {
        let (_, components) = self
            .entities
            .remove_if(&entity, |_, components| {
                self.index.remove_all(entity, components);
                self.destroyed.insert(entity);
                true
            })
            .ok_or(StoreError::UnknownEntity(entity))?;
        trace!(%entity, "entity destroyed");
        Ok(components)
    }

    /// Returns the entity's current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownEntity`] if the entity is not live.
    pub fn get(&self, entity: Entity) -> Result<Arc<ComponentSet>, StoreError> {
        self.try_get(entity)
            .ok_or(StoreError::UnknownEntity(entity))
    }

    /// Returns the entity's current snapshot, or `None` if it is not live.
    #[must_use]
    pub fn try_get(&self, entity: Entity) -> Option<Arc<ComponentSet>> {
        self.entities.get(&entity).map(|slot| Arc::clone(slot.value()))
    }

    /// Returns the entity's component of type `T`, if it has one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownEntity`] if the entity is not live.
    pub fn component<T: Component>(&self, entity: Entity) -> Result<Option<Arc<T>>, StoreError> {
        Ok(self.get(entity)?.get_arc::<T>())
    }

    /// Returns `true` if the entity is live.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Attach a component the entity does not have yet.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnknownEntity`] if the entity is not live.
    /// - [`StoreError::DuplicateComponent`] if a `T` is already attached.
    /// - [`StoreError::Component`] if another type claims `T`'s id.
    pub fn add_component<T: Component>(&self, entity: Entity, value: T) -> Result<(), StoreError> {
        self.add_stored(entity, StoredComponent::new(value))
    }

    /// Attach an already wrapped component.
    ///
    /// # Errors
    ///
    /// Same as [`EntityStore::add_component`].
    pub fn add_stored(&self, entity: Entity, component: StoredComponent) -> Result<(), StoreError> {
        self.claim(component.info())?;
        self.modify(entity, |current| match current.inserted(component) {
            Ok(next) => Ok((Some(next), ())),
            Err(ComponentError::Duplicate(name)) => Err(StoreError::DuplicateComponent {
                entity,
                component: name,
            }),
            Err(e) => Err(e.into()),
        })
    }

    /// Attach `value`, replacing any existing component of the same type.
    /// Returns the replaced component.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnknownEntity`] if the entity is not live.
    /// - [`StoreError::Component`] if another type claims `T`'s id; nothing
    ///   is replaced.
    pub fn replace_component<T: Component>(
        &self,
        entity: Entity,
        value: T,
    ) -> Result<Option<Arc<T>>, StoreError> {
        self.claim(T::info())?;
        self.modify(entity, |current| {
            let (next, previous) = current.replaced(StoredComponent::new(value))?;
            Ok((Some(next), previous.and_then(|p| p.downcast::<T>())))
        })
    }

    /// Detach the component of type `T`. Returns `false` if it was absent.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnknownEntity`] if the entity is not live.
    /// - [`StoreError::Component`] if the entity holds a different type
    ///   under `T`'s id; nothing is removed.
    pub fn remove_component<T: Component>(&self, entity: Entity) -> Result<bool, StoreError> {
        self.modify(entity, |current| {
            current.check_type(T::info())?;
            Ok(match current.removed(T::component_type_id()) {
                Some((next, _)) => (Some(next), true),
                None => (None, false),
            })
        })
    }

    /// Detach every component matching `predicate`. Returns how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownEntity`] if the entity is not live.
    pub fn remove_component_where<F>(&self, entity: Entity, predicate: F) -> Result<usize, StoreError>
    where
        F: FnMut(&StoredComponent) -> bool,
    {
        self.modify(entity, |current| {
            let (next, removed) = current.removed_where(predicate);
            Ok(match removed.len() {
                0 => (None, 0),
                n => (Some(next), n),
            })
        })
    }

    /// Record `info` as the owner of its id, or fail if another Rust type
    /// already owns it.
    fn claim(&self, info: ComponentInfo) -> Result<(), StoreError> {
        let owner = *self.claimed.entry(info.type_id).or_insert(info);
        if owner.collides_with(&info) {
            return Err(ComponentError::TypeCollision(info.name).into());
        }
        Ok(())
    }

    /// Run `f` against the entity's snapshot under its write lock and install
    /// the new snapshot it returns, if any, together with the index diff.
    fn modify<R, F>(&self, entity: Entity, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&ComponentSet) -> Result<(Option<ComponentSet>, R), StoreError>,
    {
        let mut slot = self
            .entities
            .get_mut(&entity)
            .ok_or(StoreError::UnknownEntity(entity))?;
        let (next, out) = f(slot.value())?;
        if let Some(next) = next {
            self.index.update(entity, slot.value(), &next);
            *slot.value_mut() = Arc::new(next);
        }
        Ok(out)
    }

    /// All live entities whose types satisfy every requirement of
    /// `descriptor`. An empty descriptor matches every entity.
    #[must_use]
    pub fn query(&self, descriptor: &QueryDescriptor) -> QueryResult {
        let filters = descriptor.required();
        let candidates = self
            .index
            .candidates(filters)
            .unwrap_or_else(|| self.entities());

        let rows = candidates
            .into_iter()
            .filter_map(|entity| {
                let components = self.try_get(entity)?;
                components
                    .types()
                    .matches_all(filters)
                    .then_some((entity, components))
            })
            .collect();
        QueryResult { rows }
    }

    /// Snapshot of all live entity ids.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.iter().map(|slot| *slot.key()).collect()
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of destroyed ids kept to reject recreation.
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.destroyed.len()
    }

    /// Read access to the component-type index. Only the store writes to it.
    #[must_use]
    pub fn index(&self) -> &ComponentIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use std::marker::PhantomData;
    use std::thread;

    use engine_component::{ComponentTypeId, GenericTypeId, TypeFilter};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position(f32, f32);
    impl Component for Position {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity(f32, f32);
    impl Component for Velocity {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Marker;
    impl Component for Marker {}

    const ABILITY: GenericTypeId = GenericTypeId::from_name("Ability");

    #[derive(Debug)]
    struct Ability<K>(PhantomData<K>);
    impl<K: std::fmt::Debug + Send + Sync + 'static> Component for Ability<K> {
        fn generic_definition() -> Option<GenericTypeId> {
            Some(ABILITY)
        }
    }

    #[derive(Debug)]
    struct Fire;
    #[derive(Debug)]
    struct Ice;

    fn ability<K>() -> Ability<K> {
        Ability(PhantomData)
    }

    #[test]
    fn test_count_tracks_live_entities() {
        let store = EntityStore::new();
        let ids: Vec<Entity> = (0..10)
            .map(|_| store.create(Bundle::new().with(Marker)).unwrap())
            .collect();
        assert_eq!(store.count(), 10);

        for id in &ids[..4] {
            store.destroy(*id).unwrap();
        }
        assert_eq!(store.count(), 6);
        store.create(Bundle::new()).unwrap();
        assert_eq!(store.count(), 7);
    }

    #[test]
    fn test_get_returns_snapshot() {
        let store = EntityStore::new();
        let e = store.create(Bundle::new().with(Position(0.0, 0.0))).unwrap();
        let before = store.get(e).unwrap();

        store.replace_component(e, Position(3.0, 4.0)).unwrap();

        assert_eq!(before.get::<Position>(), Some(&Position(0.0, 0.0)));
        assert_eq!(
            store.get(e).unwrap().get::<Position>(),
            Some(&Position(3.0, 4.0))
        );
    }

    #[test]
    fn test_add_component_visible_in_get_and_query() {
        let store = EntityStore::new();
        let e = store.create(Bundle::new().with(Position(0.0, 0.0))).unwrap();
        store.add_component(e, Velocity(1.0, 0.0)).unwrap();

        let snapshot = store.get(e).unwrap();
        assert_eq!(snapshot.get::<Velocity>(), Some(&Velocity(1.0, 0.0)));
        assert!(snapshot.types().contains(ComponentTypeId::of::<Velocity>()));
        assert!(
            store
                .query(&QueryDescriptor::new().with::<Velocity>())
                .contains(e)
        );
    }

    #[test]
    fn test_add_duplicate_component_fails() {
        let store = EntityStore::new();
        let e = store.create(Bundle::new().with(Position(0.0, 0.0))).unwrap();
        assert_eq!(
            store.add_component(e, Position(1.0, 1.0)),
            Err(StoreError::DuplicateComponent {
                entity: e,
                component: Position::type_name(),
            })
        );
        assert_eq!(
            store.component::<Position>(e).unwrap().as_deref(),
            Some(&Position(0.0, 0.0))
        );
    }

    #[test]
    fn test_remove_component_updates_query_and_types() {
        let store = EntityStore::new();
        let e = store
            .create(Bundle::new().with(Position(0.0, 0.0)).with(Velocity(1.0, 0.0)))
            .unwrap();

        assert!(store.remove_component::<Velocity>(e).unwrap());
        assert!(!store.remove_component::<Velocity>(e).unwrap());

        assert!(
            !store
                .query(&QueryDescriptor::new().with::<Velocity>())
                .contains(e)
        );
        assert!(
            !store
                .get(e)
                .unwrap()
                .types()
                .contains(ComponentTypeId::of::<Velocity>())
        );
    }

    #[test]
    fn test_replace_leaves_single_component() {
        let store = EntityStore::new();
        let e = store.create(Bundle::new()).unwrap();
        store.add_component(e, Position(1.0, 1.0)).unwrap();

        let previous = store.replace_component(e, Position(2.0, 2.0)).unwrap();
        assert_eq!(previous.as_deref(), Some(&Position(1.0, 1.0)));

        let snapshot = store.get(e).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get::<Position>(), Some(&Position(2.0, 2.0)));
    }

    #[test]
    fn test_replace_acts_as_add_when_absent() {
        let store = EntityStore::new();
        let e = store.create(Bundle::new()).unwrap();
        assert!(store.replace_component(e, Velocity(0.0, 1.0)).unwrap().is_none());
        assert!(
            store
                .query(&QueryDescriptor::new().with::<Velocity>())
                .contains(e)
        );
    }

    #[test]
    fn test_remove_component_where() {
        let store = EntityStore::new();
        let e = store
            .create(
                Bundle::new()
                    .with(Position(0.0, 0.0))
                    .with(ability::<Fire>())
                    .with(ability::<Ice>()),
            )
            .unwrap();

        let removed = store
            .remove_component_where(e, |c| c.info().is_instance_of(ABILITY))
            .unwrap();
        assert_eq!(removed, 2);
        assert!(
            store
                .query(&QueryDescriptor::new().with_open(ABILITY))
                .is_empty()
        );
        assert_eq!(store.get(e).unwrap().len(), 1);
        assert_eq!(store.remove_component_where(e, |_| false).unwrap(), 0);
    }

    #[test]
    fn test_query_open_generic_type() {
        let store = EntityStore::new();
        let fire = store.create(Bundle::new().with(ability::<Fire>())).unwrap();
        let ice = store
            .create(Bundle::new().with(ability::<Ice>()).with(Marker))
            .unwrap();
        let unrelated = store.create(Bundle::new().with(Marker)).unwrap();

        let result = store.query(&QueryDescriptor::new().with_open(ABILITY));
        assert_eq!(result.len(), 2);
        assert!(result.contains(fire));
        assert!(result.contains(ice));
        assert!(!result.contains(unrelated));

        let narrowed = store.query(&QueryDescriptor::new().with_open(ABILITY).with::<Marker>());
        assert_eq!(narrowed.entities().collect::<Vec<_>>(), vec![ice]);
    }

    #[test]
    fn test_query_is_point_in_time_and_restartable() {
        let store = EntityStore::new();
        let e1 = store.create(Bundle::new().with(Marker)).unwrap();
        let result = store.query(&QueryDescriptor::new().with::<Marker>());

        store.create(Bundle::new().with(Marker)).unwrap();
        store.destroy(e1).unwrap();

        assert_eq!(result.iter().count(), 1);
        assert_eq!(result.iter().map(|(e, _)| e).collect::<Vec<_>>(), vec![e1]);
        assert_eq!(store.query(&QueryDescriptor::new().with::<Marker>()).len(), 1);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let store = EntityStore::new();
        store.create(Bundle::new()).unwrap();
        store.create(Bundle::new().with(Marker)).unwrap();
        assert_eq!(store.query(&QueryDescriptor::new()).len(), 2);
    }

    #[test]
    fn test_double_destroy_matches_unknown_entity() {
        let store = EntityStore::new();
        let e = store.create(Bundle::new().with(Marker)).unwrap();
        store.destroy(e).unwrap();

        let never = Entity::generate();
        assert_eq!(store.destroy(e).unwrap_err(), StoreError::UnknownEntity(e));
        assert_eq!(
            store.destroy(never).unwrap_err(),
            StoreError::UnknownEntity(never)
        );
        assert_eq!(store.get(e).unwrap_err(), StoreError::UnknownEntity(e));
        assert_eq!(
            store.add_component(e, Marker),
            Err(StoreError::UnknownEntity(e))
        );
        assert!(store.query(&QueryDescriptor::new().with::<Marker>()).is_empty());
    }

    #[test]
    fn test_explicit_id_conflicts() {
        let store = EntityStore::new();
        let id = Entity::from_u128(7);
        store.create_with_id(id, Bundle::new()).unwrap();
        assert_eq!(
            store.create_with_id(id, Bundle::new()),
            Err(StoreError::AlreadyExists(id))
        );

        store.destroy(id).unwrap();
        assert_eq!(
            store.create_with_id(id, Bundle::new().with(Marker)),
            Err(StoreError::Resurrected(id))
        );
        assert!(!store.contains(id));
        assert_eq!(store.index().count(&TypeFilter::of::<Marker>()), 0);
    }

    #[test]
    fn test_create_rejects_duplicate_bundle() {
        let store = EntityStore::new();
        let err = store
            .create(Bundle::new().with(Marker).with(Marker))
            .unwrap_err();
        assert!(matches!(err, StoreError::Component(ComponentError::Duplicate(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_mutation_keeps_index_consistent() {
        let store = Arc::new(EntityStore::new());
        let ids: Vec<Entity> = (0..64)
            .map(|_| store.create(Bundle::new().with(Position(0.0, 0.0))).unwrap())
            .collect();

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let store = Arc::clone(&store);
                let ids = ids.clone();
                thread::spawn(move || {
                    for round in 0..50 {
                        for (i, id) in ids.iter().enumerate() {
                            if (i + worker + round) % 2 == 0 {
                                store.replace_component(*id, Velocity(1.0, 0.0)).unwrap();
                            } else {
                                store.remove_component::<Velocity>(*id).unwrap();
                            }
                        }
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let with_velocity = store.query(&QueryDescriptor::new().with::<Velocity>());
        for id in &ids {
            let has = store.get(*id).unwrap().contains::<Velocity>();
            assert_eq!(has, with_velocity.contains(*id));
        }
        assert_eq!(
            store.index().count(&TypeFilter::of::<Velocity>()),
            with_velocity.len()
        );
    }

    /// Every public mutation, followed by a check that `get`, `query` and
    /// the index report the same holders for each type.
    #[test]
    fn test_public_api_keeps_values_and_index_in_agreement() {
        let store = EntityStore::new();
        let a = store.create(Bundle::new().with(Position(0.0, 0.0))).unwrap();
        let b = store
            .create(Bundle::new().with(Position(1.0, 1.0)).with(ability::<Fire>()))
            .unwrap();
        let c = store
            .create_with_id(Entity::from_u128(42), Bundle::new().with(Marker))
            .unwrap();

        store.add_component(a, Velocity(1.0, 0.0)).unwrap();
        store.add_stored(c, StoredComponent::new(ability::<Ice>())).unwrap();
        store.replace_component(b, Velocity(0.0, 1.0)).unwrap();
        store.remove_component::<Position>(b).unwrap();
        store
            .remove_component_where(b, |s| s.info().is_instance_of(ABILITY))
            .unwrap();
        store.destroy(a).unwrap();

        let filters = [
            TypeFilter::of::<Position>(),
            TypeFilter::of::<Velocity>(),
            TypeFilter::of::<Marker>(),
            TypeFilter::of::<Ability<Fire>>(),
            TypeFilter::of::<Ability<Ice>>(),
            TypeFilter::Open(ABILITY),
        ];
        for filter in &filters {
            let queried = store.query(&QueryDescriptor::new().require(*filter));
            assert_eq!(store.index().count(filter), queried.len());
            for entity in store.entities() {
                let holds = store.get(entity).unwrap().types().matches(filter);
                assert_eq!(holds, queried.contains(entity), "{entity} / {filter:?}");
            }
        }
        assert_eq!(store.index().count(&TypeFilter::of::<Velocity>()), 1);
        assert_eq!(store.index().count(&TypeFilter::Open(ABILITY)), 1);
    }

    mod physics {
        #[derive(Debug, PartialEq)]
        pub struct Transform(pub f32);

        impl engine_component::Component for Transform {
            fn type_name() -> &'static str {
                "Transform"
            }
        }
    }

    mod render {
        #[derive(Debug, PartialEq)]
        pub struct Transform(pub f32);

        impl engine_component::Component for Transform {
            fn type_name() -> &'static str {
                "Transform"
            }
        }
    }

    #[test]
    fn test_same_named_types_cannot_share_a_slot() {
        let collision = StoreError::Component(ComponentError::TypeCollision("Transform"));
        let store = EntityStore::new();
        let e = store.create(Bundle::new().with(physics::Transform(1.0))).unwrap();

        assert_eq!(store.replace_component(e, render::Transform(2.0)), Err(collision.clone()));
        assert_eq!(store.add_component(e, render::Transform(2.0)), Err(collision.clone()));
        assert_eq!(store.remove_component::<render::Transform>(e), Err(collision.clone()));

        let snapshot = store.get(e).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get::<physics::Transform>(), Some(&physics::Transform(1.0)));

        // The id stays claimed by the first type across entities.
        assert_eq!(
            store.create(Bundle::new().with(render::Transform(3.0))),
            Err(collision)
        );
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_tombstones_grow_with_destroys() {
        let store = EntityStore::new();
        assert_eq!(store.tombstones(), 0);
        for _ in 0..5 {
            let e = store.create(Bundle::new().with(Marker)).unwrap();
            store.destroy(e).unwrap();
        }
        assert_eq!(store.tombstones(), 5);
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_rejects_nil_id() {
        let store = EntityStore::new();
        assert_eq!(
            store.create_with_id(Entity::NIL, Bundle::new().with(Marker)),
            Err(StoreError::NilEntity)
        );
        assert!(store.is_empty());
        assert_eq!(store.index().count(&TypeFilter::of::<Marker>()), 0);
    }
}
