//! Frame scheduler.
//!
//! One call to [`FrameScheduler::run_frame`] runs the frame protocol. Its
//! phases never overlap:
//!
//! 1. `before_update` on every system, descending priority, calling thread.
//! 2. One store query per system. These snapshots fix the frame's work items
//!    and are authoritative for the rest of the frame, even if an update
//!    later changes an entity's components so it no longer matches.
//! 3. Every (system, entity) work item goes through the bounded queue to the
//!    worker pool. Workers re-read the entity's snapshot at dispatch time.
//!    Items are unordered. The scheduler blocks until every item has
//!    finished: this is the frame's only barrier.
//! 4. `after_update`, descending priority.
//! 5. `before_render`, descending priority.
//! 6. Timings are recorded in the returned [`FrameReport`].
//!
//! Hook errors and panics are caught and handled per [`ErrorPolicy`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result as HookResult;
use crossbeam_channel::unbounded;
use engine_component::Entity;
use engine_world::EntityStore;
use tracing::{debug, info, trace, warn};

use crate::config::{ErrorPolicy, SchedulerConfig};
use crate::error::SchedulerError;
use crate::pool::WorkerPool;
use crate::registry::{RegisteredSystem, SystemId, SystemRegistry};
use crate::report::{FrameReport, HookFailure};
use crate::system::{Phase, System};

/// Result of one parallel work item.
enum ItemOutcome {
    Completed,
    /// The entity was destroyed before the item was dispatched.
    Skipped,
    Failed(HookFailure),
}

/// Runs registered systems against an [`EntityStore`], one frame at a time.
#[derive(Debug)]
pub struct FrameScheduler {
    store: Arc<EntityStore>,
    registry: SystemRegistry,
    pool: WorkerPool,
    config: SchedulerConfig,
    /// Number of frames started so far.
    frame: u64,
    initialized: bool,
}

impl FrameScheduler {
    /// Create a scheduler for `store`, spawning the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Spawn`] if the worker threads cannot start.
    pub fn new(store: Arc<EntityStore>, config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let pool = WorkerPool::new(config.worker_count, config.queue_capacity)?;
        Ok(Self {
            store,
            registry: SystemRegistry::new(),
            pool,
            config,
            frame: 0,
            initialized: false,
        })
    }

    /// Register a system. Its name, priority, and filter are read now.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyInitialized`] after
    /// [`FrameScheduler::initialize`] has run.
    pub fn register(&mut self, system: Arc<dyn System>) -> Result<SystemId, SchedulerError> {
        if self.initialized {
            return Err(SchedulerError::AlreadyInitialized);
        }
        let id = self.registry.register(system);
        if let Some(registered) = self.registry.get(id) {
            debug!(
                system = %registered.name,
                priority = registered.priority,
                filters = registered.filter.required().len(),
                "registered system"
            );
        }
        Ok(id)
    }

    /// Run every system's `init` hook once, in registration order.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::AlreadyInitialized`] on a second call.
    /// - [`SchedulerError::InitFailed`] for the first failing hook; later
    ///   systems are not initialised and the scheduler stays uninitialised.
    pub fn initialize(&mut self) -> Result<(), SchedulerError> {
        if self.initialized {
            return Err(SchedulerError::AlreadyInitialized);
        }
        for registered in self.registry.iter() {
            let system = &registered.system;
            if let Err(message) = invoke(|| system.init()) {
                let failure = HookFailure {
                    system: registered.name.clone(),
                    phase: Phase::Init,
                    entity: None,
                    message,
                };
                failure.log(self.frame);
                return Err(SchedulerError::InitFailed(failure));
            }
        }
        self.initialized = true;
        info!(systems = self.registry.len(), "scheduler initialised");
        Ok(())
    }

    /// Run one frame.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::NotInitialized`] before [`FrameScheduler::initialize`].
    /// - [`SchedulerError::FrameAborted`] under [`ErrorPolicy::AbortFrame`]
    ///   once a phase containing a failure has completed.
    /// - [`SchedulerError::PoolClosed`] if the workers are gone.
    pub fn run_frame(&mut self) -> Result<FrameReport, SchedulerError> {
        if !self.initialized {
            return Err(SchedulerError::NotInitialized);
        }
        self.frame += 1;
        let started = Instant::now();
        let mut report = FrameReport {
            frame: self.frame,
            ..FrameReport::default()
        };

        report.timings.before_update = self.run_sequential(Phase::BeforeUpdate, &mut report);
        self.check_policy(Phase::BeforeUpdate, &report)?;

        report.timings.update = self.run_parallel(&mut report)?;
        self.check_policy(Phase::Update, &report)?;

        report.timings.after_update = self.run_sequential(Phase::AfterUpdate, &mut report);
        self.check_policy(Phase::AfterUpdate, &report)?;

        report.timings.before_render = self.run_sequential(Phase::BeforeRender, &mut report);
        self.check_policy(Phase::BeforeRender, &report)?;

        report.elapsed = started.elapsed();
        debug!(
            frame = report.frame,
            work_items = report.work_items,
            completed = report.completed,
            skipped = report.skipped,
            failures = report.failures.len(),
            elapsed_us = report.elapsed.as_micros() as u64,
            "frame complete"
        );
        Ok(report)
    }

    /// Call one sequential hook on every system, descending priority.
    fn run_sequential(&self, phase: Phase, report: &mut FrameReport) -> Duration {
        let started = Instant::now();
        for registered in self.registry.sequential() {
            let system = &registered.system;
            let result = invoke(|| match phase {
                Phase::BeforeUpdate => system.before_update(),
                Phase::AfterUpdate => system.after_update(),
                Phase::BeforeRender => system.before_render(),
                Phase::Init | Phase::Update => Ok(()),
            });
            if let Err(message) = result {
                let failure = HookFailure {
                    system: registered.name.clone(),
                    phase,
                    entity: None,
                    message,
                };
                failure.log(self.frame);
                report.failures.push(failure);
            }
        }
        started.elapsed()
    }

    /// Snapshot every system's matches, fan the work items out to the pool,
    /// and wait for all of them.
    fn run_parallel(&self, report: &mut FrameReport) -> Result<Duration, SchedulerError> {
        let started = Instant::now();

        let snapshots: Vec<_> = self
            .registry
            .iter()
            .map(|registered| (Arc::clone(registered), self.store.query(&registered.filter)))
            .collect();
        report.work_items = snapshots.iter().map(|(_, matched)| matched.len()).sum();

        if report.work_items > self.pool.capacity() {
            warn!(
                frame = self.frame,
                work_items = report.work_items,
                capacity = self.pool.capacity(),
                "work exceeds queue capacity; producer will block"
            );
        }

        let (done_tx, done_rx) = unbounded::<ItemOutcome>();
        for (registered, matched) in &snapshots {
            for entity in matched.entities() {
                let store = Arc::clone(&self.store);
                let registered = Arc::clone(registered);
                let done = done_tx.clone();
                let frame = self.frame;
                self.pool.submit(Box::new(move || {
                    let outcome = dispatch(&store, &registered, entity, frame);
                    // The receiver outlives every job of this frame.
                    let _ = done.send(outcome);
                }))?;
            }
        }
        drop(done_tx);

        // Barrier: the channel closes once every job has been dropped, which
        // happens only after it ran.
        for outcome in done_rx {
            match outcome {
                ItemOutcome::Completed => report.completed += 1,
                ItemOutcome::Skipped => report.skipped += 1,
                ItemOutcome::Failed(failure) => report.failures.push(failure),
            }
        }
        Ok(started.elapsed())
    }

    fn check_policy(&self, phase: Phase, report: &FrameReport) -> Result<(), SchedulerError> {
        if self.config.error_policy == ErrorPolicy::AbortFrame && !report.is_clean() {
            warn!(frame = self.frame, %phase, failures = report.failures.len(), "aborting frame");
            return Err(SchedulerError::FrameAborted {
                frame: self.frame,
                phase,
                failures: report.failures.clone(),
            });
        }
        Ok(())
    }

    /// The store this scheduler runs against.
    #[must_use]
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// The registered systems.
    #[must_use]
    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    /// The scheduler configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of frames started so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns `true` once [`FrameScheduler::initialize`] has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Run one work item on a pool thread.
fn dispatch(store: &EntityStore, registered: &RegisteredSystem, entity: Entity, frame: u64) -> ItemOutcome {
    let Some(components) = store.try_get(entity) else {
        trace!(frame, system = %registered.name, %entity, "entity destroyed before dispatch");
        return ItemOutcome::Skipped;
    };
    match invoke(|| registered.system.update(entity, &components)) {
        Ok(()) => ItemOutcome::Completed,
        Err(message) => {
            let failure = HookFailure {
                system: registered.name.clone(),
                phase: Phase::Update,
                entity: Some(entity),
                message,
            };
            failure.log(frame);
            ItemOutcome::Failed(failure)
        }
    }
}

/// Call a hook, turning both `Err` and panics into a message.
fn invoke<F>(hook: F) -> Result<(), String>
where
    F: FnOnce() -> HookResult<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
