use crate::clock::{ClockEvent, TrialClock, TrialPhase};
use crate::config::TestConfig;
use crate::plan;
use crate::recorder::{KeyMatcher, ResponseRecorder};
use crate::stats::{self, RankedItem, SessionSummary};
use log::{info, warn};
use rand::Rng;
use reflex_core::{Error, StimulusCatalog, StimulusId, StimulusItem, TrialRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged(TrialPhase),
    TrialRecorded(TrialRecord),
    /// The trial's stimulus disappeared from the catalog mid-session;
    /// the response is dropped and the session moves on.
    TrialDiscarded(StimulusId),
    /// Records of the run that just finished.
    SessionComplete(Vec<TrialRecord>),
}

/// Facade the host drives. Owns the catalog, the trial clock, the
/// response recorder and the append-only log. Everything the host
/// renders comes from the events returned by the mutating calls plus
/// the read-only queries.
///
/// The log is cumulative across runs of the same `Session`;
/// `SessionComplete` carries only the records of the finished run.
pub struct Session<R: Rng> {
    catalog: StimulusCatalog,
    config: TestConfig,
    clock: TrialClock,
    recorder: ResponseRecorder,
    log: Vec<TrialRecord>,
    run_start: usize,
    rng: R,
}

impl<R: Rng> Session<R> {
    pub fn new(catalog: StimulusCatalog, rng: R) -> Self {
        let config = TestConfig::default();
        let recorder =
            ResponseRecorder::new(KeyMatcher::from_canonical(config.response_key().to_string()));
        Self {
            catalog,
            config,
            clock: TrialClock::new(),
            recorder,
            log: Vec::new(),
            run_start: 0,
            rng,
        }
    }

    /// Replaces the configuration. Rejected while a session runs.
    pub fn configure(&mut self, config: TestConfig) -> Result<(), Error> {
        if self.clock.is_running() {
            return Err(Error::State {
                operation: "configure",
                detail: "configuration is frozen while a session runs".into(),
            });
        }
        self.recorder =
            ResponseRecorder::new(KeyMatcher::from_canonical(config.response_key().to_string()));
        self.config = config;
        Ok(())
    }

    /// Plans a run over the current catalog and arms the first trial.
    /// Nothing is mutated when this fails.
    pub fn start(&mut self, now_ms: u64) -> Result<Vec<SessionEvent>, Error> {
        if self.clock.is_running() {
            return Err(Error::State {
                operation: "start",
                detail: format!("session already running in {:?}", self.clock.phase()),
            });
        }
        let plan = plan::plan(&self.catalog, self.config.repetitions(), &mut self.rng)?;
        let events = self
            .clock
            .start(plan, self.config.display_time_ms(), now_ms)?;
        self.run_start = self.log.len();
        info!(
            "session started: {} trials, display {} ms, key {:?}",
            self.clock.plan_len(),
            self.config.display_time_ms(),
            self.config.response_key(),
        );
        Ok(self.map_events(events))
    }

    /// Cancels the run and every pending timer.
    pub fn stop(&mut self) -> Vec<SessionEvent> {
        match self.clock.stop() {
            Some(event) => self.map_events(vec![event]),
            None => Vec::new(),
        }
    }

    /// Fires due timers. The host calls this at `next_deadline_ms`.
    pub fn advance(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        let events = self.clock.advance(now_ms);
        self.map_events(events)
    }

    /// Feeds one normalized input event. A no-op unless the phase is
    /// exactly the response window and the code matches the configured
    /// key; the first qualifying response settles the trial, so any
    /// later input for the same trial falls through the phase guard.
    pub fn response_key(&mut self, code: &str, now_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.clock.phase().accepts_input() || !self.recorder.matches(code) {
            return events;
        }
        let Some(stimulus) = self.clock.current_stimulus().cloned() else {
            return events;
        };
        let Some(onset_ms) = self.clock.stimulus_onset_ms() else {
            return events;
        };

        match self
            .recorder
            .record(&stimulus, onset_ms, now_ms, &mut self.catalog)
        {
            Ok(record) => {
                self.log.push(record.clone());
                events.push(SessionEvent::TrialRecorded(record));
            }
            Err(Error::NotFound(id)) => {
                warn!(
                    "stimulus {id} removed mid-session; discarding trial {}",
                    self.clock.trial_index()
                );
                events.push(SessionEvent::TrialDiscarded(id));
            }
            Err(err) => warn!("response dropped: {err}"),
        }
        // The clock advances whether the trial was recorded or
        // discarded.
        if let Some(event) = self.clock.mark_recorded(now_ms) {
            events.extend(self.map_events(vec![event]));
        }
        events
    }

    pub fn current_phase(&self) -> TrialPhase {
        self.clock.phase()
    }

    pub fn current_trial_index(&self) -> usize {
        self.clock.trial_index()
    }

    pub fn plan_len(&self) -> usize {
        self.clock.plan_len()
    }

    pub fn current_stimulus(&self) -> Option<&StimulusItem> {
        self.clock
            .current_stimulus()
            .and_then(|id| self.catalog.get(id))
    }

    /// When the host should call `advance` next. `None` while idle,
    /// complete, or waiting on subject input.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.clock.next_deadline_ms()
    }

    pub fn log(&self) -> &[TrialRecord] {
        &self.log
    }

    pub fn summary(&self) -> SessionSummary {
        stats::session_summary(&self.log)
    }

    pub fn rank(&self, ascending: bool) -> Vec<RankedItem> {
        stats::rank(&self.catalog, ascending)
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    pub fn catalog(&self) -> &StimulusCatalog {
        &self.catalog
    }

    pub fn add_stimulus(&mut self, item: StimulusItem) -> Result<(), Error> {
        self.catalog.add(item)
    }

    /// Removes an item from the catalog. Allowed mid-session; a trial
    /// that still references it is discarded when its response comes
    /// in.
    pub fn remove_stimulus(&mut self, id: &StimulusId) -> Result<StimulusItem, Error> {
        self.catalog.remove(id)
    }

    fn map_events(&self, events: Vec<ClockEvent>) -> Vec<SessionEvent> {
        events
            .into_iter()
            .map(|event| match event {
                ClockEvent::PhaseChanged(phase) => SessionEvent::PhaseChanged(phase),
                ClockEvent::PlanExhausted => {
                    SessionEvent::SessionComplete(self.log[self.run_start..].to_vec())
                }
            })
            .collect()
    }
}
