//! Worker pool for running listener invocations off the decode path.

use crate::error::{MirrorError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::warn;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads, each draining its own queue.
///
/// `submit` routes a task by key hash, so all tasks for the same key run on
/// one worker in FIFO submission order. That gives per-entity delivery
/// ordering without any ordering guarantee across keys, which is exactly
/// the contract the dispatch engine needs.
///
/// Submission never blocks on a slow worker (queues are unbounded); a task
/// that panics is logged and does not take the worker down. `shutdown`
/// rejects new submissions, lets the workers drain what was accepted, and
/// joins them.
pub struct WorkerPool {
    senders: RwLock<Option<Vec<Sender<Task>>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `threads` workers (at least one).
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let mut senders = Vec::with_capacity(threads);
        let mut workers = Vec::with_capacity(threads);

        for index in 0..threads {
            let (sender, receiver) = unbounded::<Task>();
            senders.push(sender);
            workers.push(
                thread::Builder::new()
                    .name(format!("mirror-dispatch-{index}"))
                    .spawn(move || Self::worker_loop(receiver))
                    .expect("failed to spawn dispatch worker"),
            );
        }

        Self {
            senders: RwLock::new(Some(senders)),
            workers: Mutex::new(workers),
        }
    }

    fn worker_loop(receiver: Receiver<Task>) {
        // recv only fails once all senders are gone and the queue is empty,
        // so shutdown drains accepted work before the loop exits.
        while let Ok(task) = receiver.recv() {
            if catch_unwind(AssertUnwindSafe(task)).is_err() {
                warn!("dispatch task panicked");
            }
        }
    }

    /// Enqueue a task, routed by `key`. Tasks sharing a key run in FIFO
    /// submission order on the same worker.
    pub fn submit<F>(&self, key: u64, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let senders = self.senders.read();
        let senders = senders.as_ref().ok_or(MirrorError::ShuttingDown)?;

        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % senders.len() as u64) as usize;

        senders[index]
            .send(Box::new(task))
            .map_err(|_| MirrorError::ShuttingDown)
    }

    /// Block until every task accepted so far has run. No-op after
    /// shutdown.
    pub fn flush(&self) {
        let senders = self.senders.read();
        let Some(senders) = senders.as_ref() else {
            return;
        };

        let (done_tx, done_rx) = crossbeam_channel::bounded(senders.len());
        let mut expected = 0;
        for sender in senders {
            let done_tx = done_tx.clone();
            let barrier: Task = Box::new(move || {
                let _ = done_tx.send(());
            });
            if sender.send(barrier).is_ok() {
                expected += 1;
            }
        }
        drop(done_tx);

        for _ in 0..expected {
            let _ = done_rx.recv();
        }
    }

    /// Stop accepting submissions, finish accepted work, join the workers.
    /// Idempotent.
    pub fn shutdown(&self) {
        let senders = self.senders.write().take();
        drop(senders);

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                warn!("dispatch worker exited abnormally");
            }
        }
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.senders.read().is_none()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
