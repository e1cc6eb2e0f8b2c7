use serde::{Deserialize, Serialize};

/// Opaque identity for a stimulus item. Assigned by whatever layer
/// ingests the assets; the engine only stores and compares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StimulusId(String);

impl StimulusId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StimulusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single visual asset plus its accumulated reaction measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusItem {
    pub id: StimulusId,
    /// Handle or URI the host resolves to the actual asset.
    pub source: String,
    pub label: String,
    reactions: Vec<u64>,
}

impl StimulusItem {
    pub fn new(id: StimulusId, source: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            source: source.into(),
            label: label.into(),
            reactions: Vec::new(),
        }
    }

    /// Recorded reaction times in milliseconds, in recording order.
    pub fn reactions(&self) -> &[u64] {
        &self.reactions
    }

    pub(crate) fn push_reaction(&mut self, ms: u64) {
        self.reactions.push(ms);
    }

    /// Mean reaction time rounded to the nearest millisecond, or 0
    /// when nothing has been recorded yet.
    pub fn average_reaction_ms(&self) -> u64 {
        if self.reactions.is_empty() {
            return 0;
        }
        let sum: u64 = self.reactions.iter().sum();
        (sum as f64 / self.reactions.len() as f64).round() as u64
    }
}
