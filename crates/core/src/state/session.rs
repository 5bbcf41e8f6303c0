//! Active session identity
//!
//! A session is one (queue, date) pair the dashboard is watching. Every change
//! of queue or date opens a new generation so that responses issued for an
//! earlier session can be recognised and dropped.

use crate::types::{QueueId, ReportDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag attached to every fetch cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Queue being watched
    pub queue_id: QueueId,
    /// Report date being watched
    pub date: ReportDate,
    /// Monotonic counter, bumped on every session change
    pub generation: u64,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}#{}", self.queue_id, self.date, self.generation)
    }
}

/// The queue and date the dashboard is currently connected to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Name the operator connected with
    pub queue_name: String,
    /// Key responses must carry to be applied
    pub key: SessionKey,
}

impl Session {
    /// Queue id of the session
    #[must_use]
    pub const fn queue_id(&self) -> &QueueId {
        &self.key.queue_id
    }

    /// Report date of the session
    #[must_use]
    pub const fn date(&self) -> ReportDate {
        self.key.date
    }
}
