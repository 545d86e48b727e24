//! Demo components.

use std::fmt;
use std::marker::PhantomData;

use engine_component::{Component, GenericTypeId};

/// Open identity shared by every `Ability<K>`.
pub const ABILITY: GenericTypeId = GenericTypeId::from_name("Ability");

/// Marker for an ability kind.
pub trait AbilityKind: fmt::Debug + Send + Sync + 'static {
    /// Short name used in component names and logs.
    const NAME: &'static str;
}

#[derive(Debug)]
pub struct Fire;

impl AbilityKind for Fire {
    const NAME: &'static str = "Fire";
}

#[derive(Debug)]
pub struct Frost;

impl AbilityKind for Frost {
    const NAME: &'static str = "Frost";
}

/// An ability of kind `K` with a cooldown, in seconds.
#[derive(Debug)]
pub struct Ability<K> {
    pub cooldown: f32,
    pub remaining: f32,
    kind: PhantomData<K>,
}

impl<K: AbilityKind> Ability<K> {
    /// A ready ability that recharges in `cooldown` seconds after use.
    #[must_use]
    pub fn ready(cooldown: f32) -> Self {
        Self {
            cooldown,
            remaining: 0.0,
            kind: PhantomData,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    /// The ability after `dt` seconds: fired and reset if it was ready,
    /// otherwise closer to ready.
    #[must_use]
    pub fn advanced(&self, dt: f32) -> Self {
        let remaining = if self.is_ready() {
            self.cooldown
        } else {
            (self.remaining - dt).max(0.0)
        };
        Self {
            cooldown: self.cooldown,
            remaining,
            kind: PhantomData,
        }
    }
}

impl<K: AbilityKind> Component for Ability<K> {
    fn generic_definition() -> Option<GenericTypeId> {
        Some(ABILITY)
    }
}
