use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use folio_common::RemoteIdentity;
use tokio::task::AbortHandle;

/// Quiet periods before an autosave fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    /// first save of a draft that has no remote identity yet
    pub create_delay: Duration,
    /// every save once the draft exists remotely
    pub update_delay: Duration,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self {
            create_delay: Duration::from_millis(3000),
            update_delay: Duration::from_millis(1500),
        }
    }
}

impl DelayPolicy {
    pub fn delay_for(&self, identity: &RemoteIdentity) -> Duration {
        if identity.is_assigned() {
            self.update_delay
        } else {
            self.create_delay
        }
    }
}

/// Trailing-edge debounce on top of a tokio timer task.
///
/// Every `schedule` aborts the timer still pending and starts a new one, so the
/// action fires at most once per quiet period. Dropping the debouncer cancels
/// whatever is pending.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Mutex<Option<AbortHandle>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F, Fut>(&self, delay: Duration, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.lock();

        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // detached so that re-arming never aborts an action already running
            tokio::spawn(action());
        });

        *pending = Some(timer.abort_handle());
    }

    /// Abort the pending timer. Returns true if one was still armed.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                let armed = !handle.is_finished();
                handle.abort();
                armed
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
