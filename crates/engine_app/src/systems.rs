//! Demo systems.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use engine_component::{ComponentSet, Entity, QueryDescriptor};
use engine_math::{Position, Velocity};
use engine_system::System;
use engine_world::EntityStore;
use tracing::{debug, info};

use crate::components::{ABILITY, Ability, AbilityKind};

/// Integrates [`Velocity`] into [`Position`].
pub struct Motion {
    store: Arc<EntityStore>,
    dt: f32,
}

impl Motion {
    pub fn new(store: Arc<EntityStore>, dt: f32) -> Self {
        Self { store, dt }
    }
}

impl System for Motion {
    fn name(&self) -> &str {
        "motion"
    }

    fn filter(&self) -> QueryDescriptor {
        QueryDescriptor::new().with::<Position>().with::<Velocity>()
    }

    fn priority(&self) -> i32 {
        10
    }

    fn update(&self, entity: Entity, components: &ComponentSet) -> Result<()> {
        let position = components.require::<Position>()?;
        let velocity = components.require::<Velocity>()?;
        self.store
            .replace_component(entity, position.integrated(*velocity, self.dt))?;
        Ok(())
    }
}

/// Destroys entities that leave a circular arena.
///
/// Updates only collect escapees; destruction happens in `after_update`,
/// once the parallel pass is over.
pub struct Arena {
    store: Arc<EntityStore>,
    radius: f32,
    escaped: Mutex<Vec<Entity>>,
}

impl Arena {
    pub fn new(store: Arc<EntityStore>, radius: f32) -> Self {
        Self {
            store,
            radius,
            escaped: Mutex::new(Vec::new()),
        }
    }
}

impl System for Arena {
    fn name(&self) -> &str {
        "arena"
    }

    fn filter(&self) -> QueryDescriptor {
        QueryDescriptor::new().with::<Position>()
    }

    fn update(&self, entity: Entity, components: &ComponentSet) -> Result<()> {
        let position = components.require::<Position>()?;
        if position.distance(Position::ORIGIN) > self.radius {
            self.escaped
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(entity);
        }
        Ok(())
    }

    fn after_update(&self) -> Result<()> {
        let escaped = std::mem::take(
            &mut *self.escaped.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for entity in escaped {
            if self.store.contains(entity) {
                self.store.destroy(entity)?;
                info!(%entity, "entity left the arena");
            }
        }
        Ok(())
    }
}

/// Ticks every `Ability<K>` of one kind.
pub struct Cooldown<K> {
    store: Arc<EntityStore>,
    dt: f32,
    fired: AtomicUsize,
    kind: PhantomData<fn() -> K>,
}

impl<K: AbilityKind> Cooldown<K> {
    pub fn new(store: Arc<EntityStore>, dt: f32) -> Self {
        Self {
            store,
            dt,
            fired: AtomicUsize::new(0),
            kind: PhantomData,
        }
    }
}

impl<K: AbilityKind> System for Cooldown<K> {
    fn name(&self) -> &str {
        K::NAME
    }

    fn filter(&self) -> QueryDescriptor {
        QueryDescriptor::new().with::<Ability<K>>()
    }

    fn update(&self, entity: Entity, components: &ComponentSet) -> Result<()> {
        let ability = components.require::<Ability<K>>()?;
        if ability.is_ready() {
            self.fired.fetch_add(1, Ordering::Relaxed);
        }
        self.store.replace_component(entity, ability.advanced(self.dt))?;
        Ok(())
    }

    fn before_render(&self) -> Result<()> {
        let fired = self.fired.swap(0, Ordering::Relaxed);
        if fired > 0 {
            debug!(kind = K::NAME, fired, "abilities fired");
        }
        Ok(())
    }
}

/// Counts ability instances of every kind through the open `Ability` type.
#[derive(Default)]
pub struct AbilityCensus {
    holders: AtomicUsize,
    instances: AtomicUsize,
}

impl AbilityCensus {
    /// Entities holding at least one ability, as of the last frame.
    pub fn holders(&self) -> usize {
        self.holders.load(Ordering::Relaxed)
    }

    /// Ability components across all entities, as of the last frame.
    pub fn instances(&self) -> usize {
        self.instances.load(Ordering::Relaxed)
    }
}

impl System for AbilityCensus {
    fn name(&self) -> &str {
        "ability_census"
    }

    fn filter(&self) -> QueryDescriptor {
        QueryDescriptor::new().with_open(ABILITY)
    }

    fn priority(&self) -> i32 {
        -10
    }

    fn before_update(&self) -> Result<()> {
        self.holders.store(0, Ordering::Relaxed);
        self.instances.store(0, Ordering::Relaxed);
        Ok(())
    }

    fn update(&self, _entity: Entity, components: &ComponentSet) -> Result<()> {
        self.holders.fetch_add(1, Ordering::Relaxed);
        self.instances
            .fetch_add(components.instances_of(ABILITY).count(), Ordering::Relaxed);
        Ok(())
    }

    fn after_update(&self) -> Result<()> {
        debug!(
            holders = self.holders(),
            instances = self.instances(),
            "ability census"
        );
        Ok(())
    }
}
