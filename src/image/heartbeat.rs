// ABOUTME: Scoped liveness signal held while an image builds.
// ABOUTME: Dropping the guard stops the signal on every exit path.

use tokio::task::JoinHandle;

/// Liveness signal acquired from a builder for the duration of a build.
///
/// The background task is aborted and the release hook runs when the guard
/// is dropped, whether the build succeeded, failed, or was cancelled.
#[must_use = "the heartbeat stops as soon as the guard is dropped"]
pub struct Heartbeat {
    task: Option<JoinHandle<()>>,
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl Heartbeat {
    /// A heartbeat for builders that don't need one.
    pub fn noop() -> Self {
        Self {
            task: None,
            on_release: None,
        }
    }

    /// Wrap a spawned heartbeat loop.
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self {
            task: Some(task),
            on_release: None,
        }
    }

    /// Run `f` once when the heartbeat is released.
    pub fn on_release(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(f));
        self
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(f) = self.on_release.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Heartbeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heartbeat")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn drop_aborts_task_and_runs_release_hook() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();

        let task = tokio::spawn(async {
            loop {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        let heartbeat = Heartbeat::from_task(task).on_release(move || {
            flag.store(true, Ordering::SeqCst);
        });
        assert!(heartbeat.is_active());

        drop(heartbeat);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn noop_is_inactive() {
        assert!(!Heartbeat::noop().is_active());
    }
}
