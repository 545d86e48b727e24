//! Fixed-rate frame loop.
//!
//! [`TickLoop`] drives a [`FrameScheduler`] at a target rate: it initialises
//! the scheduler if needed, runs one frame per tick, sleeps off the rest of
//! the tick budget, and stops after `max_ticks` frames or when its
//! [`ShutdownHandle`] is triggered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::SchedulerError;
use crate::scheduler::FrameScheduler;

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    /// Duration of one tick. Non-positive rates run frames back to back.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        if self.tick_rate > 0.0 && self.tick_rate.is_finite() {
            Duration::from_secs_f64(1.0 / self.tick_rate)
        } else {
            Duration::ZERO
        }
    }
}

/// Requests a running [`TickLoop`] to stop after its current frame.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    /// Ask the loop to stop.
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`ShutdownHandle::shutdown`] has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs frames at a fixed rate.
#[derive(Debug)]
pub struct TickLoop {
    config: TickConfig,
    /// Ticks completed by this loop.
    ticks: u64,
    shutdown: ShutdownHandle,
}

impl TickLoop {
    /// Create a new tick loop with the given configuration.
    #[must_use]
    pub fn new(config: TickConfig) -> Self {
        Self {
            config,
            ticks: 0,
            shutdown: ShutdownHandle::default(),
        }
    }

    /// Returns a handle that stops this loop from another thread.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Returns the number of ticks completed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run until `max_ticks` is reached or shutdown is requested. Returns
    /// the number of ticks run by this call.
    ///
    /// Frame failures under [`ErrorPolicy::Continue`](crate::ErrorPolicy::Continue)
    /// are logged by the scheduler and do not stop the loop.
    ///
    /// # Errors
    ///
    /// Propagates initialisation errors and any error returned by
    /// [`FrameScheduler::run_frame`].
    pub fn run(&mut self, scheduler: &mut FrameScheduler) -> Result<u64, SchedulerError> {
        if !scheduler.is_initialized() {
            scheduler.initialize()?;
        }

        let tick_duration = self.config.tick_duration();
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            if self.shutdown.is_shutdown() {
                info!(ticks = tick_count, "tick loop stopped");
                break;
            }

            let start = Instant::now();
            scheduler.run_frame()?;
            self.ticks += 1;

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                thread::sleep(tick_duration - elapsed);
            } else if !tick_duration.is_zero() {
                warn!(
                    frame = scheduler.frame(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "frame exceeded time budget"
                );
            }
        }
        Ok(tick_count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use anyhow::Result;
    use engine_component::{ComponentSet, Entity, QueryDescriptor};
    use engine_world::EntityStore;

    use super::*;
    use crate::config::SchedulerConfig;
    use crate::system::System;

    /// Counts frames and stops the loop after `stop_after`.
    struct FrameCounter {
        frames: AtomicUsize,
        stop_after: usize,
        shutdown: ShutdownHandle,
    }

    impl System for FrameCounter {
        fn filter(&self) -> QueryDescriptor {
            QueryDescriptor::new()
        }

        fn before_render(&self) -> Result<()> {
            let frames = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
            if frames >= self.stop_after {
                self.shutdown.shutdown();
            }
            Ok(())
        }

        fn update(&self, _entity: Entity, _components: &ComponentSet) -> Result<()> {
            Ok(())
        }
    }

    fn scheduler() -> FrameScheduler {
        FrameScheduler::new(
            Arc::new(EntityStore::new()),
            SchedulerConfig::default().with_workers(2),
        )
        .unwrap()
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = TickConfig {
            tick_rate: 1000.0,
            max_ticks: 5,
        };
        let mut scheduler = scheduler();
        let mut tick_loop = TickLoop::new(config);
        assert_eq!(tick_loop.run(&mut scheduler).unwrap(), 5);
        assert_eq!(tick_loop.ticks(), 5);
        assert_eq!(scheduler.frame(), 5);
        assert!(scheduler.is_initialized());
    }

    #[test]
    fn test_shutdown_handle_stops_loop() {
        let mut tick_loop = TickLoop::new(TickConfig {
            tick_rate: 1000.0,
            max_ticks: 0,
        });
        let mut scheduler = scheduler();
        let counter = Arc::new(FrameCounter {
            frames: AtomicUsize::new(0),
            stop_after: 3,
            shutdown: tick_loop.shutdown_handle(),
        });
        scheduler.register(counter.clone()).unwrap();

        assert_eq!(tick_loop.run(&mut scheduler).unwrap(), 3);
        assert_eq!(counter.frames.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_tick_duration_handles_zero_rate() {
        let config = TickConfig {
            tick_rate: 0.0,
            max_ticks: 1,
        };
        assert_eq!(config.tick_duration(), Duration::ZERO);
        assert_eq!(
            TickConfig::default().tick_duration(),
            Duration::from_secs_f64(1.0 / 60.0)
        );
    }
}
