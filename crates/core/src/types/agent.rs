//! Agent Records

use serde::{Deserialize, Serialize};

/// Performance snapshot of one agent staffed on the active queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// Platform user id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Presence or routing status as reported by the platform
    #[serde(default)]
    pub status: Option<String>,
    /// Interactions answered on the report date
    #[serde(default)]
    pub answered: u64,
    /// Average handle time in seconds
    #[serde(default)]
    pub average_handle_time: Option<f64>,
}

impl AgentRecord {
    /// Create agent record
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: None,
            answered: 0,
            average_handle_time: None,
        }
    }

    /// Set routing status
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Set answered count
    #[must_use]
    pub const fn with_answered(mut self, answered: u64) -> Self {
        self.answered = answered;
        self
    }
}
