//! Holder for a single cancellable background task.

use std::future::Future;

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::trace;

/// Owns at most one running task. Installing a new task aborts the previous
/// one, and dropping the slot aborts whatever is still running.
#[derive(Debug, Default)]
pub struct TaskSlot {
    current: Mutex<Option<AbortHandle>>,
}

impl TaskSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `future` and installs it, cancelling the previous task.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.replace(&handle);
        handle
    }

    /// Installs an already spawned task. Returns true if a running task was
    /// cancelled to make room.
    pub fn replace<T>(&self, handle: &JoinHandle<T>) -> bool {
        let previous = self.current.lock().replace(handle.abort_handle());
        previous.is_some_and(Self::abort)
    }

    /// Cancels the installed task. Returns true if it was still running.
    pub fn cancel(&self) -> bool {
        self.current.lock().take().is_some_and(Self::abort)
    }

    /// Returns true while the installed task is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn abort(handle: AbortHandle) -> bool {
        let running = !handle.is_finished();
        if running {
            trace!("Cancelling superseded task");
            handle.abort();
        }
        running
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.current.get_mut().take() {
            handle.abort();
        }
    }
}
