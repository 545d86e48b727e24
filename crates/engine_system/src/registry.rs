//! System registry: tracks registered systems and their sequential order.
//!
//! Each system's name, priority, and filter are captured once at
//! registration. The registry keeps systems in registration order (used for
//! `init` and for building the parallel pass) and maintains a second
//! ordering by descending priority for the sequential hooks. Systems are
//! never removed.

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use engine_component::QueryDescriptor;

use crate::system::System;

/// Index of a system in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub usize);

/// A system together with the metadata captured at registration.
pub struct RegisteredSystem {
    /// Registration-order identifier.
    pub id: SystemId,
    /// The system's name.
    pub name: String,
    /// Sequential-hook priority (higher first).
    pub priority: i32,
    /// Component requirements.
    pub filter: QueryDescriptor,
    /// The system itself.
    pub system: Arc<dyn System>,
}

impl fmt::Debug for RegisteredSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredSystem")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Registry of all systems known to the scheduler.
#[derive(Debug, Default)]
pub struct SystemRegistry {
    /// Systems in registration order.
    systems: Vec<Arc<RegisteredSystem>>,
    /// Indices into `systems`, by descending priority then registration.
    sequential: Vec<usize>,
}

impl SystemRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system, capturing its name, priority, and filter.
    pub fn register(&mut self, system: Arc<dyn System>) -> SystemId {
        let id = SystemId(self.systems.len());
        self.systems.push(Arc::new(RegisteredSystem {
            id,
            name: system.name().to_string(),
            priority: system.priority(),
            filter: system.filter(),
            system,
        }));

        self.sequential = (0..self.systems.len()).collect();
        // Stable sort keeps registration order among equal priorities.
        self.sequential
            .sort_by_key(|&i| Reverse(self.systems[i].priority));
        id
    }

    /// Returns a system by id.
    #[must_use]
    pub fn get(&self, id: SystemId) -> Option<&Arc<RegisteredSystem>> {
        self.systems.get(id.0)
    }

    /// Iterate systems in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RegisteredSystem>> {
        self.systems.iter()
    }

    /// Iterate systems in sequential-hook order.
    pub fn sequential(&self) -> impl Iterator<Item = &Arc<RegisteredSystem>> {
        self.sequential.iter().map(|&i| &self.systems[i])
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no systems are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use engine_component::{Component, ComponentSet, Entity};

    use super::*;

    #[derive(Debug)]
    struct Transform;
    impl Component for Transform {}

    struct Named {
        name: &'static str,
        priority: i32,
    }

    impl System for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn filter(&self) -> QueryDescriptor {
            QueryDescriptor::new().with::<Transform>()
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn update(&self, _entity: Entity, _components: &ComponentSet) -> Result<()> {
            Ok(())
        }
    }

    fn named(name: &'static str, priority: i32) -> Arc<dyn System> {
        Arc::new(Named { name, priority })
    }

    fn sequential_names(registry: &SystemRegistry) -> Vec<&str> {
        registry.sequential().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_register_captures_metadata() {
        let mut registry = SystemRegistry::new();
        let id = registry.register(named("physics", 3));
        let info = registry.get(id).unwrap();
        assert_eq!(info.name, "physics");
        assert_eq!(info.priority, 3);
        assert_eq!(info.filter, QueryDescriptor::new().with::<Transform>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sequential_order_descending_priority() {
        let mut registry = SystemRegistry::new();
        registry.register(named("low", -1));
        registry.register(named("high", 10));
        registry.register(named("mid", 5));
        assert_eq!(sequential_names(&registry), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_sequential_ties_keep_registration_order() {
        let mut registry = SystemRegistry::new();
        registry.register(named("a", 1));
        registry.register(named("b", 2));
        registry.register(named("c", 1));
        registry.register(named("d", 2));
        assert_eq!(sequential_names(&registry), vec!["b", "d", "a", "c"]);

        let registration: Vec<_> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(registration, vec!["a", "b", "c", "d"]);
    }
}
