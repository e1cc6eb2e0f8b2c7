use reflex_core::{StimulusCatalog, StimulusId, TrialRecord};
use serde::Serialize;
use std::collections::HashSet;

/// Aggregates over the full session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Distinct stimuli with at least one measurement in the log.
    pub tested_items: usize,
    pub total_measurements: usize,
    /// Rounded mean over every record, 0 when the log is empty.
    pub mean_reaction_ms: u64,
}

pub fn session_summary(log: &[TrialRecord]) -> SessionSummary {
    let tested: HashSet<&StimulusId> = log.iter().map(|record| &record.stimulus_id).collect();
    let mean_reaction_ms = if log.is_empty() {
        0
    } else {
        let sum: u64 = log.iter().map(|record| record.reaction_ms).sum();
        (sum as f64 / log.len() as f64).round() as u64
    };
    SessionSummary {
        tested_items: tested.len(),
        total_measurements: log.len(),
        mean_reaction_ms,
    }
}

/// One catalog entry with at least one measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    pub id: StimulusId,
    pub label: String,
    pub measurements: usize,
    pub average_ms: u64,
}

/// Items ordered by average reaction time. The sort is stable, so ties
/// keep catalog insertion order in both directions; items that were
/// never measured are left out entirely.
pub fn rank(catalog: &StimulusCatalog, ascending: bool) -> Vec<RankedItem> {
    let mut ranked: Vec<RankedItem> = catalog
        .items()
        .iter()
        .filter(|item| !item.reactions().is_empty())
        .map(|item| RankedItem {
            id: item.id.clone(),
            label: item.label.clone(),
            measurements: item.reactions().len(),
            average_ms: item.average_reaction_ms(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        if ascending {
            a.average_ms.cmp(&b.average_ms)
        } else {
            b.average_ms.cmp(&a.average_ms)
        }
    });
    ranked
}
