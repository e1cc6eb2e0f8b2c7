use rand::Rng;
use rand::seq::SliceRandom;
use reflex_core::{Error, StimulusCatalog, StimulusId};

/// The randomized order of stimulus occurrences for one session.
/// Materialized once at start, read-only during playback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialPlan {
    trials: Vec<StimulusId>,
}

impl TrialPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StimulusId> {
        self.trials.get(index)
    }

    pub fn trials(&self) -> &[StimulusId] {
        &self.trials
    }
}

/// Builds the session order: every catalog item repeated `repetitions`
/// times, shuffled with Fisher-Yates. A comparator fed random values
/// does not produce uniform permutations; the shuffle must stay
/// unbiased.
pub fn plan<R: Rng + ?Sized>(
    catalog: &StimulusCatalog,
    repetitions: u32,
    rng: &mut R,
) -> Result<TrialPlan, Error> {
    if catalog.is_empty() {
        return Err(Error::Validation("catalog has no stimuli to plan".into()));
    }
    let mut trials = Vec::with_capacity(catalog.len() * repetitions as usize);
    for item in catalog.items() {
        for _ in 0..repetitions {
            trials.push(item.id.clone());
        }
    }
    trials.shuffle(rng);
    Ok(TrialPlan { trials })
}
