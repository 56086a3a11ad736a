// ── Task handle ──
//
// Ownership slot for at most one cancellable background task. Replacing
// the held task cancels the old one first; clearing or dropping the handle
// cancels whatever it holds. Cancellation is requested, never awaited.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct HeldTask {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl HeldTask {
    fn cancel(self) {
        self.cancel.cancel();
        self.join.abort();
    }
}

/// Holds zero or one running background task.
#[derive(Default)]
pub struct TaskHandle {
    held: Option<HeldTask>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a running task, cancelling the previously held one.
    pub fn set(&mut self, cancel: CancellationToken, join: JoinHandle<()>) {
        if let Some(prior) = self.held.replace(HeldTask { cancel, join }) {
            prior.cancel();
        }
    }

    /// Spawn `task` with a fresh child token of `parent` and hold it.
    ///
    /// The previous task (if any) is cancelled before the new one is spawned.
    pub fn spawn<F, Fut>(&mut self, parent: &CancellationToken, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.clear();
        let cancel = parent.child_token();
        let join = tokio::spawn(task(cancel.clone()));
        self.held = Some(HeldTask { cancel, join });
    }

    /// Whether a task is currently held, finished or not.
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Whether the held task is still running.
    pub fn is_active(&self) -> bool {
        self.held
            .as_ref()
            .is_some_and(|task| !task.join.is_finished() && !task.cancel.is_cancelled())
    }

    /// Cancel and release the held task.
    pub fn clear(&mut self) {
        if let Some(task) = self.held.take() {
            task.cancel();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("held", &self.is_held())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn set_cancels_previous_task() {
        let mut handle = TaskHandle::new();
        let first = CancellationToken::new();
        handle.set(first.clone(), tokio::spawn(std::future::pending()));
        assert!(handle.is_active());

        let second = CancellationToken::new();
        handle.set(second.clone(), tokio::spawn(std::future::pending()));

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(handle.is_active());
    }

    #[tokio::test]
    async fn drop_cancels_held_task() {
        let token = CancellationToken::new();
        {
            let mut handle = TaskHandle::new();
            handle.set(token.clone(), tokio::spawn(std::future::pending()));
        }
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn clear_releases_task() {
        let mut handle = TaskHandle::new();
        let parent = CancellationToken::new();
        handle.spawn(&parent, |cancel| async move { cancel.cancelled().await });
        assert!(handle.is_held());

        handle.clear();
        assert!(!handle.is_held());
        assert!(!handle.is_active());
        assert!(!parent.is_cancelled(), "only the child token is cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn finished_task_is_held_but_not_active() {
        let mut handle = TaskHandle::new();
        handle.spawn(&CancellationToken::new(), |_| async {});
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(handle.is_held());
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn parent_cancellation_reaches_child() {
        let parent = CancellationToken::new();
        let mut handle = TaskHandle::new();
        handle.spawn(&parent, |cancel| async move { cancel.cancelled().await });

        parent.cancel();
        assert!(!handle.is_active());
    }
}
