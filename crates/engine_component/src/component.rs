//! Core [`Component`] trait and associated type identity.
//!
//! Every piece of data stored in the ECS must implement [`Component`]. The
//! trait requires `Send + Sync + 'static` so component values can be shared
//! between the store and worker threads without copying.
//!
//! ## Type identity
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 64-bit hash algorithm. Generic components additionally report
//! an open identity, a [`GenericTypeId`], which is shared by every closed
//! instantiation (`Ability<Fire>`, `Ability<Ice>`, ...). Queries use the open
//! identity to match all instantiations at once.

use std::any::TypeId;
use std::fmt;

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0100_0000_01b3;

const fn fnv1a(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// A unique identifier for a concrete (closed) component type, derived from
/// its string name using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// Compute the [`ComponentTypeId`] from a component's string name.
    ///
    /// # Algorithm (FNV-1a 64-bit)
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325          (offset basis)
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3  (prime)
    /// return hash
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a(name))
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        T::component_type_id()
    }
}

/// The open (unbound) identity of a generic component type, e.g. `Ability<>`.
///
/// Declared by the generic type itself, usually as a `const`:
///
/// ```rust
/// use engine_component::{Component, GenericTypeId};
///
/// pub const ABILITY: GenericTypeId = GenericTypeId::from_name("Ability");
///
/// #[derive(Debug)]
/// pub struct Ability<K> {
///     pub cooldown: f32,
///     pub kind: std::marker::PhantomData<K>,
/// }
///
/// impl<K: std::fmt::Debug + Send + Sync + 'static> Component for Ability<K> {
///     fn generic_definition() -> Option<GenericTypeId> {
///         Some(ABILITY)
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenericTypeId(pub u64);

impl GenericTypeId {
    /// Compute the open identity from the generic type's bare name.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a(name))
    }
}

/// Runtime metadata about a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentInfo {
    /// The closed type identifier.
    pub type_id: ComponentTypeId,
    /// The human-readable name of the component.
    pub name: &'static str,
    /// The open identity when the type is a generic instantiation.
    pub generic: Option<GenericTypeId>,
    /// The Rust type behind the name. Two types that report the same name
    /// share a [`ComponentTypeId`] but never a `TypeId`.
    pub rust_type: TypeId,
}

impl ComponentInfo {
    /// Returns the [`ComponentInfo`] for `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        T::info()
    }

    /// Returns `true` if this type is an instantiation of `generic`.
    #[must_use]
    pub fn is_instance_of(&self, generic: GenericTypeId) -> bool {
        self.generic == Some(generic)
    }

    /// Returns `true` if `other` claims the same [`ComponentTypeId`] for a
    /// different Rust type.
    #[must_use]
    pub fn collides_with(&self, other: &ComponentInfo) -> bool {
        self.type_id == other.type_id && self.rust_type != other.rust_type
    }
}

impl fmt::Display for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The core component trait.
///
/// Components are immutable once attached to an entity: changing one means
/// replacing it through the store.
///
/// # Examples
///
/// ```rust
/// use engine_component::Component;
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Send + Sync + fmt::Debug + 'static {
    /// A human-readable name for this component type.
    ///
    /// Defaults to the fully qualified Rust type name, which is distinct for
    /// every instantiation of a generic type.
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId
    where
        Self: Sized,
    {
        ComponentTypeId::from_name(Self::type_name())
    }

    /// Returns the open identity if this type instantiates a generic
    /// component. Non-generic components return `None`.
    fn generic_definition() -> Option<GenericTypeId>
    where
        Self: Sized,
    {
        None
    }

    /// Returns the [`ComponentInfo`] descriptor for this component type.
    fn info() -> ComponentInfo
    where
        Self: Sized,
    {
        ComponentInfo {
            type_id: Self::component_type_id(),
            name: Self::type_name(),
            generic: Self::generic_definition(),
            rust_type: TypeId::of::<Self>(),
        }
    }
}
