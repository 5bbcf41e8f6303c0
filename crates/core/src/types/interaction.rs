//! Interaction Records
//!
//! Metadata of recent calls on a queue. Listed for operators, never aggregated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of an interaction relative to the contact center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionDirection {
    /// Customer called in
    Inbound,
    /// Agent called out
    Outbound,
    /// Not reported
    #[default]
    #[serde(other)]
    Unknown,
}

/// Recent call or conversation on the active queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    /// Conversation id
    pub conversation_id: String,
    /// Recording reference, when the call was recorded
    #[serde(default)]
    pub recording_id: Option<String>,
    /// Conversation start
    pub started_at: DateTime<Utc>,
    /// Conversation end, absent while still connected
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Participant display names or addresses
    #[serde(default)]
    pub participants: Vec<String>,
    /// Call direction
    #[serde(default)]
    pub direction: InteractionDirection,
}

impl InteractionRecord {
    /// Conversation duration in seconds, if it has ended
    #[must_use]
    pub fn duration_secs(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_seconds().max(0))
    }

    /// Whether a recording can be fetched for this interaction
    #[must_use]
    pub const fn has_recording(&self) -> bool {
        self.recording_id.is_some()
    }
}
