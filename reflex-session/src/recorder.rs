use chrono::Utc;
use reflex_core::{Error, StimulusCatalog, StimulusId, TrialRecord};

/// Canonical form of a key code. The space bar arrives under several
/// names depending on the host (a literal `" "`, `"Space"`,
/// `"Spacebar"`); all of them collapse to `"Space"`. Any other code is
/// trimmed and kept as-is; matching is case-insensitive. Blank codes
/// fail validation.
pub fn normalize_key(code: &str) -> Result<String, Error> {
    if code == " " {
        return Ok("Space".into());
    }
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("response key must not be empty".into()));
    }
    if trimmed.eq_ignore_ascii_case("space") || trimmed.eq_ignore_ascii_case("spacebar") {
        return Ok("Space".into());
    }
    Ok(trimmed.to_string())
}

/// Compares incoming key codes against the configured response key.
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    expected: String,
}

impl KeyMatcher {
    pub fn new(configured: &str) -> Result<Self, Error> {
        Ok(Self {
            expected: normalize_key(configured)?,
        })
    }

    /// For keys that were already normalized, e.g. by `TestConfig`.
    pub(crate) fn from_canonical(expected: String) -> Self {
        Self { expected }
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn matches(&self, code: &str) -> bool {
        match normalize_key(code) {
            Ok(code) => code.eq_ignore_ascii_case(&self.expected),
            Err(_) => false,
        }
    }
}

/// Turns the first qualifying input of a trial into a `TrialRecord`.
/// Phase gating stays with the session; this type only matches keys,
/// computes the reaction time, and writes the measurement through the
/// catalog's single append path.
#[derive(Debug)]
pub struct ResponseRecorder {
    matcher: KeyMatcher,
    next_id: usize,
}

impl ResponseRecorder {
    pub fn new(matcher: KeyMatcher) -> Self {
        Self {
            matcher,
            next_id: 0,
        }
    }

    pub fn matches(&self, code: &str) -> bool {
        self.matcher.matches(code)
    }

    /// Records one reaction. Fails with NotFound when the stimulus was
    /// removed from the catalog mid-session; the caller discards the
    /// trial but still lets the clock advance.
    pub fn record(
        &mut self,
        stimulus: &StimulusId,
        onset_ms: u64,
        now_ms: u64,
        catalog: &mut StimulusCatalog,
    ) -> Result<TrialRecord, Error> {
        let reaction_ms = now_ms.saturating_sub(onset_ms);
        let label = catalog
            .get(stimulus)
            .ok_or_else(|| Error::NotFound(stimulus.clone()))?
            .label
            .clone();
        catalog.record_reaction(stimulus, reaction_ms)?;

        let record = TrialRecord {
            id: self.next_id,
            timestamp: Utc::now(),
            stimulus_id: stimulus.clone(),
            stimulus_label: label,
            reaction_ms,
            response_key: self.matcher.expected().to_string(),
        };
        self.next_id += 1;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflex_core::StimulusItem;

    #[test]
    fn space_aliases_collapse_to_one_code() {
        let matcher = KeyMatcher::new("Space").unwrap();
        for alias in [" ", "space", "Spacebar", "SPACE"] {
            assert!(matcher.matches(alias), "{alias:?} should match Space");
        }
        assert!(!matcher.matches("Enter"));
    }

    #[test]
    fn other_keys_match_case_insensitively() {
        let matcher = KeyMatcher::new("KeyA").unwrap();
        assert!(matcher.matches("keya"));
        assert!(!matcher.matches("KeyB"));
    }

    #[test]
    fn blank_key_fails_validation() {
        assert!(matches!(KeyMatcher::new("  "), Err(Error::Validation(_))));
        assert!(matches!(KeyMatcher::new(""), Err(Error::Validation(_))));
    }

    #[test]
    fn record_measures_from_the_onset_timestamp() {
        let mut catalog = StimulusCatalog::new();
        let id = StimulusId::new("a");
        catalog
            .add(StimulusItem::new(id.clone(), "a.png", "A"))
            .unwrap();
        let mut recorder = ResponseRecorder::new(KeyMatcher::new("Space").unwrap());

        let record = recorder.record(&id, 1500, 1550, &mut catalog).unwrap();
        assert_eq!(record.reaction_ms, 50);
        assert_eq!(record.stimulus_label, "A");
        assert_eq!(record.response_key, "Space");
        assert_eq!(catalog.get(&id).unwrap().reactions(), &[50]);
    }

    #[test]
    fn record_ids_are_sequential() {
        let mut catalog = StimulusCatalog::new();
        let id = StimulusId::new("a");
        catalog
            .add(StimulusItem::new(id.clone(), "a.png", "A"))
            .unwrap();
        let mut recorder = ResponseRecorder::new(KeyMatcher::new("Space").unwrap());
        let first = recorder.record(&id, 0, 10, &mut catalog).unwrap();
        let second = recorder.record(&id, 20, 40, &mut catalog).unwrap();
        assert_eq!((first.id, second.id), (0, 1));
    }

    #[test]
    fn record_on_removed_stimulus_is_not_found() {
        let mut catalog = StimulusCatalog::new();
        let id = StimulusId::new("gone");
        let mut recorder = ResponseRecorder::new(KeyMatcher::new("Space").unwrap());
        assert_eq!(
            recorder.record(&id, 0, 10, &mut catalog),
            Err(Error::NotFound(id))
        );
    }
}
