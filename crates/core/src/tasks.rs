//! Detached background work (view-counter bumps and their cache follow-up).
//!
//! Requests never await these tasks. Tests and shutdown call
//! [`DetachedTasks::drain`] to wait for everything scheduled so far.

use std::future::Future;

use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Default)]
pub struct DetachedTasks {
    tracker: TaskTracker,
}

impl DetachedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `fut` on the runtime without awaiting it.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(fut);
    }

    /// Number of scheduled tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every task scheduled so far. New tasks may be spawned again
    /// afterwards.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
