//! Deferred execution for drain cycles.
//!
//! The batcher never drains inline: it asks a [`Scheduler`] to run the drain
//! later. Production code uses [`TokioScheduler`]; tests use
//! [`ManualScheduler`], a fake clock that only runs tasks when told to.

use crate::error::{PreviewError, PreviewResult};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;

/// A unit of deferred work.
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks after a delay.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` to run once `delay` has elapsed. Must not run it inline.
    fn schedule(&self, delay: Duration, task: ScheduledTask);
}

/// Schedules tasks on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Uses the runtime the caller is running on.
    pub fn current() -> PreviewResult<Self> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|e| PreviewError::NoRuntime(e.to_string()))
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

struct PendingTask {
    due: Duration,
    seq: u64,
    task: ScheduledTask,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    tasks: Vec<PendingTask>,
}

impl ManualState {
    /// Removes the earliest task due at or before `limit`.
    fn pop_due(&mut self, limit: Duration) -> Option<PendingTask> {
        let idx = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= limit)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        Some(self.tasks.swap_remove(idx))
    }
}

/// Fake-clock scheduler for tests.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    /// Current fake time.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of tasks waiting to run.
    pub fn pending_count(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Runs every task that is due without advancing the clock, including
    /// tasks scheduled with zero delay by the tasks being run.
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let now = self.now();
        self.run_until(now)
    }

    /// Advances the clock by `by`, running tasks in due order.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let ran = self.run_until(target);
        let mut state = self.state.lock();
        state.now = state.now.max(target);
        ran
    }

    fn run_until(&self, limit: Duration) -> usize {
        let mut ran = 0;
        loop {
            let next = {
                let mut state = self.state.lock();
                let next = state.pop_due(limit);
                if let Some(task) = &next {
                    state.now = state.now.max(task.due);
                }
                next
            };
            match next {
                Some(pending) => {
                    (pending.task)();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) {
        let mut state = self.state.lock();
        let due = state.now + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.tasks.push(PendingTask { due, seq, task });
    }
}
