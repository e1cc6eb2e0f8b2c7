use crate::recorder::normalize_key;
use reflex_core::Error;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const DISPLAY_TIME_MS: RangeInclusive<u64> = 100..=2000;
pub const REPETITIONS: RangeInclusive<u32> = 1..=10;

/// Session parameters. Validated on construction and frozen while a
/// session runs; the planner and the clock copy what they need at
/// session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    display_time_ms: u64,
    repetitions: u32,
    response_key: String,
}

impl TestConfig {
    pub fn new(display_time_ms: u64, repetitions: u32, response_key: &str) -> Result<Self, Error> {
        if !DISPLAY_TIME_MS.contains(&display_time_ms) {
            return Err(Error::Validation(format!(
                "display time {display_time_ms} ms outside {}..={} ms",
                DISPLAY_TIME_MS.start(),
                DISPLAY_TIME_MS.end(),
            )));
        }
        if !REPETITIONS.contains(&repetitions) {
            return Err(Error::Validation(format!(
                "repetitions {repetitions} outside {}..={}",
                REPETITIONS.start(),
                REPETITIONS.end(),
            )));
        }
        Ok(Self {
            display_time_ms,
            repetitions,
            response_key: normalize_key(response_key)?,
        })
    }

    /// How long each stimulus stays on screen.
    pub fn display_time_ms(&self) -> u64 {
        self.display_time_ms
    }

    /// How many times each catalog item appears in the plan.
    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Canonical form of the configured response key.
    pub fn response_key(&self) -> &str {
        &self.response_key
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            display_time_ms: 500,
            repetitions: 3,
            response_key: "Space".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_values_at_the_bounds() {
        assert!(TestConfig::new(100, 1, "Space").is_ok());
        assert!(TestConfig::new(2000, 10, "KeyA").is_ok());
    }

    #[test]
    fn rejects_out_of_range_display_time() {
        assert!(matches!(
            TestConfig::new(99, 3, "Space"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            TestConfig::new(2001, 3, "Space"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_repetitions() {
        assert!(matches!(
            TestConfig::new(500, 0, "Space"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            TestConfig::new(500, 11, "Space"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rejects_blank_response_key() {
        assert!(matches!(
            TestConfig::new(500, 3, "   "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn normalizes_the_response_key() {
        let config = TestConfig::new(500, 3, "spacebar").unwrap();
        assert_eq!(config.response_key(), "Space");
    }
}
