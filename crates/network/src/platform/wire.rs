//! Response bodies of the reporting platform

use queuepulse_core::types::{AgentRecord, InteractionRecord, IntervalRecord};
use serde::Deserialize;

/// Paged listing envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Entities<T> {
    #[serde(default = "Vec::new")]
    pub entities: Vec<T>,
}

/// Entry of the routing queue directory
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QueueEntity {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Body of the queue metrics endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MetricsPayload {
    pub history: Vec<IntervalRecord>,
    pub agents: Vec<AgentRecord>,
}

pub(crate) type QueueDirectory = Entities<QueueEntity>;
pub(crate) type InteractionList = Entities<InteractionRecord>;

/// Pick the directory entry for `name`: exact match first, then a
/// case-insensitive one, then whatever the platform ranked first
pub(crate) fn best_match<'a>(entities: &'a [QueueEntity], name: &str) -> Option<&'a QueueEntity> {
    entities
        .iter()
        .find(|q| q.name == name)
        .or_else(|| entities.iter().find(|q| q.name.eq_ignore_ascii_case(name)))
        .or_else(|| entities.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_match_prefers_exact_name() -> Result<(), serde_json::Error> {
        let directory: QueueDirectory = serde_json::from_str(
            r#"{"entities":[{"id":"a","name":"Support Tier 2"},{"id":"b","name":"support"},{"id":"c","name":"Support"}]}"#,
        )?;
        assert_eq!(best_match(&directory.entities, "Support").map(|q| q.id.as_str()), Some("c"));
        assert_eq!(best_match(&directory.entities, "SUPPORT").map(|q| q.id.as_str()), Some("b"));
        assert_eq!(best_match(&directory.entities, "Billing").map(|q| q.id.as_str()), Some("a"));
        assert!(best_match(&[], "Support").is_none());
        Ok(())
    }

    #[test]
    fn test_missing_lists_default_to_empty() -> Result<(), serde_json::Error> {
        let payload: MetricsPayload = serde_json::from_str("{}")?;
        assert!(payload.history.is_empty());
        assert!(payload.agents.is_empty());

        let list: InteractionList = serde_json::from_str("{}")?;
        assert!(list.entities.is_empty());
        Ok(())
    }
}
