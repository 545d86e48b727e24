//! Fixed-size worker pool fed by a single bounded queue.
//!
//! [`WorkerPool::submit`] blocks while the queue is full, so a producer can
//! never outrun the workers by more than the queue capacity and no job is
//! ever dropped.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, error};

use crate::error::SchedulerError;

/// A unit of work executed on a pool thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads draining one bounded job queue.
#[derive(Debug)]
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    capacity: usize,
}

impl WorkerPool {
    /// Spawn `worker_count` threads sharing a queue of `capacity` slots.
    /// Both values are raised to at least one.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Spawn`] if a thread cannot be started.
    pub fn new(worker_count: usize, capacity: usize) -> Result<Self, SchedulerError> {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded::<Job>(capacity);

        let workers = (0..worker_count.max(1))
            .map(|id| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("engine-worker-{id}"))
                    .spawn(move || worker_loop(id, &receiver))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(workers = workers.len(), capacity, "worker pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
            capacity,
        })
    }

    /// Queue a job, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PoolClosed`] if no worker is left to take it.
    pub fn submit(&self, job: Job) -> Result<(), SchedulerError> {
        let sender = self.sender.as_ref().ok_or(SchedulerError::PoolClosed)?;
        sender.send(job).map_err(|_| SchedulerError::PoolClosed)
    }

    /// Returns the number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Returns the queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue lets every worker fall out of its loop.
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("worker thread panicked during shutdown");
            }
        }
    }
}

fn worker_loop(id: usize, receiver: &Receiver<Job>) {
    for job in receiver.iter() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(worker = id, "job panicked");
        }
    }
    debug!(worker = id, "worker exiting");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_runs_every_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(4, 8).unwrap();
            for _ in 0..100 {
                let counter = Arc::clone(&counter);
                pool.submit(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
            }
            // Dropping the pool drains the queue and joins the workers.
        }
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_small_queue_applies_back_pressure_without_loss() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(1, 1).unwrap();
        assert_eq!(pool.capacity(), 1);
        assert_eq!(pool.worker_count(), 1);

        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            pool.submit(Box::new(move || {
                thread::sleep(Duration::from_millis(1));
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }
        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_worker_survives_panicking_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(1, 4).unwrap();
        pool.submit(Box::new(|| panic!("boom"))).unwrap();
        let after = Arc::clone(&counter);
        pool.submit(Box::new(move || {
            after.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();
        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
