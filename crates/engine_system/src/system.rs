//! The [`System`] contract.

use std::fmt;

use anyhow::Result;
use engine_component::{ComponentSet, Entity, QueryDescriptor};

/// A stage of the frame protocol, used to label hook invocations in logs and
/// failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// One-time bootstrap, before the first frame.
    Init,
    /// Sequential, before the parallel pass.
    BeforeUpdate,
    /// Parallel, once per matching entity.
    Update,
    /// Sequential, after every update has returned.
    AfterUpdate,
    /// Sequential, last step of the frame.
    BeforeRender,
}

impl Phase {
    /// Returns a stable lowercase name for structured logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::BeforeUpdate => "before_update",
            Phase::Update => "update",
            Phase::AfterUpdate => "after_update",
            Phase::BeforeRender => "before_render",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of behaviour run by the [`FrameScheduler`](crate::FrameScheduler).
///
/// A system declares which components an entity must hold to be of interest
/// ([`System::filter`]) and implements [`System::update`], which the
/// scheduler calls once per matching entity per frame, in parallel and in no
/// particular order. Everything else is optional.
///
/// Systems receive the store they mutate at construction time, typically as
/// an `Arc<EntityStore>` field. All hooks take `&self`; state that changes
/// between calls needs interior mutability (atomics, locks).
///
/// Hooks report expected failures through `Err`. The scheduler also catches
/// panics, so neither form can take down the frame unnoticed; see
/// [`ErrorPolicy`](crate::ErrorPolicy) for what happens next.
pub trait System: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Component requirements. Read once, at registration.
    fn filter(&self) -> QueryDescriptor;

    /// Ordering key for the sequential hooks: higher runs first. Ties keep
    /// registration order. Has no effect on the parallel update pass.
    fn priority(&self) -> i32 {
        0
    }

    /// Called once, in registration order, before the first frame.
    fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Called once per frame before the parallel pass.
    fn before_update(&self) -> Result<()> {
        Ok(())
    }

    /// Called once per frame for every entity matching [`System::filter`].
    ///
    /// `components` is the entity's snapshot read at dispatch time. Writes go
    /// through the store and are not guaranteed to be visible to other
    /// updates of the same frame.
    fn update(&self, entity: Entity, components: &ComponentSet) -> Result<()>;

    /// Called once per frame after every update has returned.
    fn after_update(&self) -> Result<()> {
        Ok(())
    }

    /// Called once per frame after all after-update hooks.
    fn before_render(&self) -> Result<()> {
        Ok(())
    }
}
