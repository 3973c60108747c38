use std::sync::Arc;
use tokio::sync::Notify;

/// Cancellation handle for one spawned repeating task.
///
/// The task selects on [`Timer::token`]; cancelling is idempotent and also
/// happens when the handle drops, so a room that goes away takes its tasks
/// with it.
#[derive(Debug, Default)]
pub struct Timer {
    cancel_token: Arc<Notify>,
    cancelled: bool,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Arc<Notify> {
        Arc::clone(&self.cancel_token)
    }

    /// Returns true only for the call that actually cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.cancelled = true;
        // notify_one stores a permit, so a task that is between polls still sees it
        self.cancel_token.notify_one();
        true
    }

    pub fn format_time(duration: u32) -> String {
        let minutes = duration / 60;
        let seconds = duration % 60;
        format!("{}:{:02}", minutes, seconds)
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
