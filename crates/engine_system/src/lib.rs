//! # engine_system
//!
//! System contract, registry, and frame scheduler for the ECS runtime.
//!
//! A [`System`] declares a component filter and per-phase hooks. The
//! [`FrameScheduler`] runs every registered system against a shared
//! [`EntityStore`](engine_world::EntityStore): sequential hooks in priority
//! order, then one parallel update per matching entity on a bounded worker
//! pool, then the remaining sequential hooks.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use engine_component::{ComponentSet, Entity, QueryDescriptor};
//! use engine_system::{FrameScheduler, SchedulerConfig, System};
//! use engine_world::EntityStore;
//!
//! struct Noop;
//!
//! impl System for Noop {
//!     fn filter(&self) -> QueryDescriptor {
//!         QueryDescriptor::new()
//!     }
//!
//!     fn update(&self, _: Entity, _: &ComponentSet) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), engine_system::SchedulerError> {
//! let store = Arc::new(EntityStore::new());
//! let mut scheduler = FrameScheduler::new(store, SchedulerConfig::from_env())?;
//! scheduler.register(Arc::new(Noop))?;
//! scheduler.initialize()?;
//! let report = scheduler.run_frame()?;
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod system;
pub mod tick;

pub use config::{ErrorPolicy, SchedulerConfig};
pub use error::SchedulerError;
pub use pool::WorkerPool;
pub use registry::{RegisteredSystem, SystemId, SystemRegistry};
pub use report::{FrameReport, HookFailure, PhaseTimings};
pub use scheduler::FrameScheduler;
pub use system::{Phase, System};
pub use tick::{ShutdownHandle, TickConfig, TickLoop};
