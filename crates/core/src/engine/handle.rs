//! Poll schedule handle

use crate::state::SessionKey;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Handle to a running poll schedule
///
/// Clones refer to the same schedule. Dropping a handle does not stop the
/// schedule; call [`PollHandle::cancel`] or [`PollHandle::stop`].
#[derive(Debug, Clone)]
pub struct PollHandle {
    key: SessionKey,
    token: CancellationToken,
    finished: watch::Receiver<()>,
}

impl PollHandle {
    pub(crate) const fn new(
        key: SessionKey,
        token: CancellationToken,
        finished: watch::Receiver<()>,
    ) -> Self {
        Self {
            key,
            token,
            finished,
        }
    }

    /// Session the schedule polls for
    #[must_use]
    pub const fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Request the schedule to stop
    ///
    /// No cycle starts after this returns. A cycle already past its fetch may
    /// still be applying; use [`PollHandle::stop`] to wait for it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel the schedule and wait until its task has exited
    pub async fn stop(&self) {
        self.token.cancel();
        let mut finished = self.finished.clone();
        // The task owns the sender; `changed` fails once it is gone.
        while finished.changed().await.is_ok() {}
    }

    /// Whether the schedule is still running
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.finished.has_changed().is_ok()
    }
}
