//! Task queue monitor.
//!
//! All three pieces of shared scheduling state (the FIFO, the outstanding
//! counter, the stopping flag) live behind a single mutex with two condition
//! variables: one woken when work arrives or shutdown is requested, one
//! woken when the batch drains. `outstanding` counts tasks that have been
//! enqueued but not yet *finished*: a dequeued task still in flight keeps
//! the batch from reporting drained.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// One file's normalization job. Immutable once enqueued; consumed by
/// exactly one worker.
#[derive(Clone, Debug)]
pub struct Task {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// File name used for banners and diagnostics.
    pub display_name: String,
    pub target_peak: f32,
}

#[derive(Default)]
struct QueueState {
    fifo: VecDeque<Task>,
    outstanding: usize,
    stopping: bool,
}

/// Thread-safe FIFO of pending tasks plus the outstanding-task counter.
#[derive(Default)]
pub struct TaskQueue {
    state: Mutex<QueueState>,
    new_task: Condvar,
    drained: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task and wake one blocked worker.
    pub fn enqueue(&self, task: Task) {
        let mut state = self.lock();
        state.fifo.push_back(task);
        state.outstanding += 1;
        self.new_task.notify_one();
    }

    /// Block until a task is available or shutdown is requested.
    ///
    /// Returns `None` only when the FIFO is empty *and* stopping was
    /// requested; pending tasks are always handed out first, so shutdown is
    /// a graceful drain rather than preemption.
    pub fn dequeue(&self) -> Option<Task> {
        let mut state = self.lock();
        loop {
            if let Some(task) = state.fifo.pop_front() {
                return Some(task);
            }
            if state.stopping {
                return None;
            }
            state = self
                .new_task
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Record completion of a previously dequeued task. Wakes drain waiters
    /// once every enqueued task has finished.
    pub fn mark_done(&self) {
        let mut state = self.lock();
        debug_assert!(state.outstanding > 0, "mark_done without matching dequeue");
        state.outstanding = state.outstanding.saturating_sub(1);
        if state.outstanding == 0 && state.fifo.is_empty() {
            self.drained.notify_all();
        }
    }

    /// Ask idle workers to exit once the FIFO is empty.
    pub fn request_stop(&self) {
        let mut state = self.lock();
        state.stopping = true;
        self.new_task.notify_all();
    }

    /// Block until every enqueued task has been fully processed.
    pub fn await_drain(&self) {
        let mut state = self.lock();
        while state.outstanding > 0 {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Number of tasks enqueued but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn task(name: &str) -> Task {
        Task {
            input_path: PathBuf::from(name),
            output_path: PathBuf::from(format!("out/{name}")),
            display_name: name.to_owned(),
            target_peak: 1.0,
        }
    }

    #[test]
    fn dequeue_preserves_fifo_order() {
        let queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.enqueue(task("b"));
        queue.enqueue(task("c"));

        assert_eq!(queue.dequeue().expect("task").display_name, "a");
        assert_eq!(queue.dequeue().expect("task").display_name, "b");
        assert_eq!(queue.dequeue().expect("task").display_name, "c");
    }

    #[test]
    fn dequeue_returns_none_when_stopped_and_empty() {
        let queue = TaskQueue::new();
        queue.request_stop();
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn pending_tasks_are_drained_before_stop_takes_effect() {
        let queue = TaskQueue::new();
        queue.enqueue(task("pending"));
        queue.request_stop();

        assert!(queue.dequeue().is_some());
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn blocked_dequeue_is_woken_by_request_stop() {
        let queue = Arc::new(TaskQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue())
        };

        // Give the waiter time to block on the condvar first.
        thread::sleep(Duration::from_millis(50));
        queue.request_stop();

        assert!(waiter.join().expect("waiter thread").is_none());
    }

    #[test]
    fn every_task_is_delivered_exactly_once() {
        const TASKS: usize = 100;
        const WORKERS: usize = 4;

        let queue = Arc::new(TaskQueue::new());
        for n in 0..TASKS {
            queue.enqueue(task(&format!("task-{n}")));
        }

        let completions = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..WORKERS {
            let queue = Arc::clone(&queue);
            let completions = Arc::clone(&completions);
            handles.push(thread::spawn(move || {
                while let Some(_task) = queue.dequeue() {
                    completions.fetch_add(1, Ordering::SeqCst);
                    queue.mark_done();
                }
            }));
        }

        queue.await_drain();
        assert_eq!(queue.outstanding(), 0);
        assert_eq!(completions.load(Ordering::SeqCst), TASKS);

        queue.request_stop();
        for handle in handles {
            handle.join().expect("worker thread");
        }
    }

    #[test]
    fn outstanding_counts_in_flight_tasks() {
        let queue = TaskQueue::new();
        queue.enqueue(task("a"));

        let in_flight = queue.dequeue().expect("task");
        assert_eq!(queue.outstanding(), 1, "dequeued task still counts");

        drop(in_flight);
        queue.mark_done();
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn await_drain_returns_immediately_when_nothing_queued() {
        let queue = TaskQueue::new();
        queue.await_drain();
    }
}
