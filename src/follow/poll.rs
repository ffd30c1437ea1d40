/// Periodic follow-status re-check session
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::debug;

/// At most one periodic task per view
#[derive(Debug, Default)]
pub struct PollSession {
    handle: Option<JoinHandle<()>>,
}

impl PollSession {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Start the periodic task unless one is already running.
    ///
    /// The first tick fires one `period` after the call. `tick` returning
    /// `false` ends the session.
    pub fn ensure<F, Fut>(&mut self, period: Duration, mut tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        if self.is_active() {
            return false;
        }

        debug!("Starting follow status poll every {:?}", period);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !tick().await {
                    debug!("Follow status poll ended by its owner");
                    break;
                }
            }
        });
        self.handle = Some(handle);
        true
    }

    /// Cancel the running task, if any
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Stopping follow status poll");
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.stop();
    }
}
