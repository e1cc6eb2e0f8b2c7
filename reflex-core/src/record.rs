use crate::stimulus::StimulusId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed trial. Written once when the first qualifying
/// response arrives, never mutated, appended to the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: usize,
    pub timestamp: DateTime<Utc>,
    pub stimulus_id: StimulusId,
    /// Label copied at record time so the log stays readable after
    /// the item is removed from the catalog.
    pub stimulus_label: String,
    pub reaction_ms: u64,
    pub response_key: String,
}
