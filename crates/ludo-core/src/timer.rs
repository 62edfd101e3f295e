//! Cancellable one-slot timers for the room actor.
//!
//! Each slot holds at most one spawned task. Arming a slot aborts whatever
//! was there. Aborting is best effort: a task may already have queued its
//! message, so every timer message also carries an epoch the actor checks
//! before acting.

use std::future::Future;

use tokio::task::JoinHandle;

/// A slot owning at most one pending timer task.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// An empty slot.
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Replace the pending task with `task`.
    pub fn arm<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(task));
    }

    /// Abort the pending task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a task is pending.
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
