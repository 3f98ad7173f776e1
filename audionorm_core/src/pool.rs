//! Fixed-size worker pool.
//!
//! Workers are long-lived OS threads that loop dequeue → pipeline →
//! mark_done until the queue hands them a stop. Success and failure are
//! counted with dedicated monotonic counters at the worker boundary; the
//! queue's outstanding counter is a scheduling primitive, not a report.

use std::io;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::logger::SharedLogger;
use crate::pipeline;
use crate::queue::TaskQueue;
use crate::ProgressEvent;

/// Shared progress callback invoked from worker threads.
pub type ProgressFn = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Counters accumulated by the pool over one batch, read after join.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerCounts {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    succeeded: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Spawn `workers` named threads draining `queue`.
    ///
    /// A spawn failure is returned to the caller; the threads that did start
    /// remain blocked on the (still empty, if the dispatcher enqueues after
    /// starting the pool) queue and are shut down by the caller's error path.
    pub fn start(
        queue: Arc<TaskQueue>,
        logger: Arc<SharedLogger>,
        workers: NonZeroUsize,
        total_tasks: usize,
        progress: ProgressFn,
    ) -> io::Result<Self> {
        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(workers.get());
        for index in 0..workers.get() {
            let queue = Arc::clone(&queue);
            let logger = Arc::clone(&logger);
            let succeeded = Arc::clone(&succeeded);
            let failed = Arc::clone(&failed);
            let completed = Arc::clone(&completed);
            let progress = Arc::clone(&progress);

            let handle = thread::Builder::new()
                .name(format!("audionorm-worker-{index}"))
                .spawn(move || {
                    worker_loop(
                        &queue, &logger, &succeeded, &failed, &completed, total_tasks, &progress,
                    )
                })?;
            handles.push(handle);
        }

        Ok(Self {
            handles,
            succeeded,
            failed,
        })
    }

    /// Block until every worker thread has terminated.
    pub fn join_all(self) -> WorkerCounts {
        for handle in self.handles {
            if let Err(panic) = handle.join() {
                log::error!("worker thread panicked: {panic:?}");
            }
        }
        WorkerCounts {
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

fn worker_loop(
    queue: &TaskQueue,
    logger: &SharedLogger,
    succeeded: &AtomicUsize,
    failed: &AtomicUsize,
    completed: &AtomicUsize,
    total_tasks: usize,
    progress: &ProgressFn,
) {
    while let Some(task) = queue.dequeue() {
        match pipeline::process_task(&task, logger) {
            Ok(()) => {
                succeeded.fetch_add(1, Ordering::SeqCst);
                log::info!(
                    "successfully processed and saved: {}",
                    task.output_path.display()
                );
            }
            Err(err) => {
                failed.fetch_add(1, Ordering::SeqCst);
                log::error!("failed to process {}: {err}", task.display_name);
            }
        }

        // Progress fires before mark_done so the drain wakeup implies every
        // Advance event has been delivered.
        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        progress(ProgressEvent::Advance {
            completed: done,
            total: total_tasks,
        });
        queue.mark_done();
    }
}
