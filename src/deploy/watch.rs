// ABOUTME: Polls asynchronous control plane work until it reaches a terminal state.
// ABOUTME: Release command and release evaluation watchers with interval and timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::MissedTickBehavior;

use crate::api::{self, ApiError, Progress, StatusReport, StatusSource};
use crate::types::{AppName, EvaluationId, ReleaseCommandId};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("{what} failed: {reason}")]
    Failed { what: String, reason: String },

    #[error("timed out after {} waiting for {what}", humantime::format_duration(*after))]
    TimedOut { what: String, after: Duration },

    #[error("failed to check {what} status: {source}")]
    Api {
        what: String,
        #[source]
        source: ApiError,
    },
}

/// Waits for release-side work to finish.
#[async_trait]
pub trait ReleaseWatcher: Send + Sync {
    async fn watch_release_command(
        &self,
        app: &AppName,
        id: &ReleaseCommandId,
    ) -> Result<(), WatchError>;

    async fn watch_deployment(&self, app: &AppName, id: &EvaluationId) -> Result<(), WatchError>;
}

/// Call `poll` every `interval` until it reports success or failure.
///
/// The first poll happens immediately. Exceeding `timeout` returns
/// [`WatchError::TimedOut`]; the remote work itself is left alone.
pub async fn poll_until_terminal<F, Fut>(
    what: &str,
    interval: Duration,
    timeout: Duration,
    mut poll: F,
) -> Result<(), WatchError>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = api::Result<StatusReport>> + Send,
{
    let watch = async {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<String> = None;

        loop {
            ticker.tick().await;
            let report = poll().await.map_err(|source| WatchError::Api {
                what: what.to_string(),
                source,
            })?;

            match report.progress() {
                Progress::Succeeded => {
                    tracing::debug!(what, "reached terminal success");
                    return Ok(());
                }
                Progress::Failed(reason) => {
                    return Err(WatchError::Failed {
                        what: what.to_string(),
                        reason,
                    });
                }
                Progress::InFlight(state) => {
                    if last.as_deref() != Some(state.as_str()) {
                        tracing::debug!(what, state = %state, "status changed");
                        last = Some(state);
                    }
                }
            }
        }
    };

    tokio::time::timeout(timeout, watch)
        .await
        .unwrap_or_else(|_| {
            Err(WatchError::TimedOut {
                what: what.to_string(),
                after: timeout,
            })
        })
}

/// [`ReleaseWatcher`] that polls a [`StatusSource`].
pub struct PollingWatcher<S> {
    source: S,
    interval: Duration,
    timeout: Duration,
}

impl<S: StatusSource> PollingWatcher<S> {
    pub fn new(source: S, interval: Duration, timeout: Duration) -> Self {
        Self {
            source,
            interval,
            timeout,
        }
    }
}

#[async_trait]
impl<S: StatusSource> ReleaseWatcher for PollingWatcher<S> {
    async fn watch_release_command(
        &self,
        app: &AppName,
        id: &ReleaseCommandId,
    ) -> Result<(), WatchError> {
        poll_until_terminal("release command", self.interval, self.timeout, || {
            self.source.release_command_status(app, id)
        })
        .await
    }

    async fn watch_deployment(&self, app: &AppName, id: &EvaluationId) -> Result<(), WatchError> {
        poll_until_terminal("deployment", self.interval, self.timeout, || {
            self.source.evaluation_status(app, id)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn scripted(statuses: &[&str]) -> Mutex<VecDeque<StatusReport>> {
        Mutex::new(statuses.iter().map(|s| StatusReport::new(*s)).collect())
    }

    #[tokio::test(start_paused = true)]
    async fn returns_once_status_succeeds() {
        let script = scripted(&["pending", "running", "succeeded"]);
        let mut polls = 0;

        poll_until_terminal("deployment", Duration::from_secs(1), Duration::from_secs(60), || {
            polls += 1;
            let next = script.lock().unwrap().pop_front();
            async move { next.ok_or_else(|| ApiError::Other("script exhausted".into())) }
        })
        .await
        .unwrap();

        assert_eq!(polls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failure_carries_reason() {
        let err = poll_until_terminal("release command", Duration::from_secs(1), Duration::from_secs(60), || async {
            Ok(StatusReport {
                status: "failed".to_string(),
                message: Some("exit code 3".to_string()),
            })
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "release command failed: exit code 3");
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_timeout() {
        let err = poll_until_terminal("deployment", Duration::from_secs(1), Duration::from_secs(5), || async {
            Ok(StatusReport::new("running"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, WatchError::TimedOut { after, .. } if after == Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn api_errors_abort_the_watch() {
        let err = poll_until_terminal("deployment", Duration::from_secs(1), Duration::from_secs(5), || async {
            Err(ApiError::Unauthorized)
        })
        .await
        .unwrap_err();

        assert!(matches!(err, WatchError::Api { .. }));
    }
}
