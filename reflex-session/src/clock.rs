use crate::plan::TrialPlan;
use log::{debug, warn};
use reflex_core::{Error, StimulusId};
use reflex_timing::{DelayQueue, TimerToken};
use serde::{Deserialize, Serialize};

/// Delay before each trial's stimulus comes up.
pub const ARMED_DELAY_MS: u64 = 1_000;
/// Blank flash between stimulus removal and the response window.
pub const MASK_DURATION_MS: u64 = 100;
/// Pause after a recorded response before the next trial arms.
pub const RECORDED_DELAY_MS: u64 = 800;

/// Phases of one trial. Only `ResponseWindow` accepts subject input;
/// every other transition is timer-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialPhase {
    Idle,
    Armed,
    Presenting,
    Masking,
    ResponseWindow,
    Recorded,
    Complete,
}

impl TrialPhase {
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::ResponseWindow)
    }

    /// Idle and Complete are the rest states a new session may start
    /// from.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Idle | Self::Complete)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    PhaseChanged(TrialPhase),
    /// The last trial was recorded and its inter-trial delay elapsed.
    PlanExhausted,
}

/// Timer-driven state machine for one running session.
///
/// Owns the plan, the current phase and trial index, and every pending
/// timer. Nothing else mutates this state; observers read it through
/// the query methods and the events returned from the mutating calls.
///
/// Exactly one timer is expected at a time. Each scheduled timer
/// carries a generation + sequence token; a token that no longer
/// matches when it fires is a stale timer from a cancelled or
/// superseded schedule and is dropped with a warning.
pub struct TrialClock {
    phase: TrialPhase,
    plan: TrialPlan,
    trial_index: usize,
    display_time_ms: u64,
    onset_ms: Option<u64>,
    generation: u64,
    next_seq: u64,
    expected_seq: Option<u64>,
    timers: DelayQueue,
}

impl TrialClock {
    pub fn new() -> Self {
        Self {
            phase: TrialPhase::Idle,
            plan: TrialPlan::empty(),
            trial_index: 0,
            display_time_ms: 0,
            onset_ms: None,
            generation: 0,
            next_seq: 0,
            expected_seq: None,
            timers: DelayQueue::new(),
        }
    }

    /// Loads a plan and arms the first trial. Fails with a state error
    /// unless the clock is Idle or Complete.
    pub fn start(
        &mut self,
        plan: TrialPlan,
        display_time_ms: u64,
        now_ms: u64,
    ) -> Result<Vec<ClockEvent>, Error> {
        if !self.phase.is_terminal() {
            return Err(Error::State {
                operation: "start",
                detail: format!("session already running in {:?}", self.phase),
            });
        }
        if plan.is_empty() {
            return Err(Error::Validation("trial plan is empty".into()));
        }
        self.generation += 1;
        self.timers.clear();
        self.plan = plan;
        self.trial_index = 0;
        self.display_time_ms = display_time_ms;
        self.onset_ms = None;

        let event = self.set_phase(TrialPhase::Armed);
        self.arm_timer(ARMED_DELAY_MS, now_ms);
        Ok(vec![event])
    }

    /// Cancels every pending timer and returns to Idle. Anything still
    /// in flight is also invalidated by the generation bump.
    pub fn stop(&mut self) -> Option<ClockEvent> {
        if self.phase == TrialPhase::Idle {
            return None;
        }
        self.generation += 1;
        self.expected_seq = None;
        self.timers.clear();
        self.plan = TrialPlan::empty();
        self.trial_index = 0;
        self.onset_ms = None;
        Some(self.set_phase(TrialPhase::Idle))
    }

    /// Fires every due timer and applies the resulting transitions.
    pub fn advance(&mut self, now_ms: u64) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        for token in self.timers.pop_due(now_ms) {
            if token.generation != self.generation || Some(token.seq) != self.expected_seq {
                warn!("dropping stale timer {token:?} (generation {})", self.generation);
                continue;
            }
            self.expected_seq = None;
            match self.phase {
                TrialPhase::Armed => {
                    events.push(self.set_phase(TrialPhase::Presenting));
                    self.arm_timer(self.display_time_ms, now_ms);
                }
                TrialPhase::Presenting => {
                    // Reaction time is measured from the moment the
                    // stimulus comes down, not from trial start.
                    self.onset_ms = Some(now_ms);
                    events.push(self.set_phase(TrialPhase::Masking));
                    self.arm_timer(MASK_DURATION_MS, now_ms);
                }
                TrialPhase::Masking => {
                    // Unbounded: stays open until a qualifying key.
                    events.push(self.set_phase(TrialPhase::ResponseWindow));
                }
                TrialPhase::Recorded => {
                    self.onset_ms = None;
                    if self.trial_index + 1 < self.plan.len() {
                        self.trial_index += 1;
                        events.push(self.set_phase(TrialPhase::Armed));
                        self.arm_timer(ARMED_DELAY_MS, now_ms);
                    } else {
                        events.push(self.set_phase(TrialPhase::Complete));
                        events.push(ClockEvent::PlanExhausted);
                    }
                }
                other => warn!("timer fired in {other:?}; ignoring"),
            }
        }
        events
    }

    /// Called by the response path after the trial's outcome is
    /// settled; schedules the inter-trial delay. Returns `None` when
    /// the clock is not in the response window.
    pub fn mark_recorded(&mut self, now_ms: u64) -> Option<ClockEvent> {
        if self.phase != TrialPhase::ResponseWindow {
            return None;
        }
        let event = self.set_phase(TrialPhase::Recorded);
        self.arm_timer(RECORDED_DELAY_MS, now_ms);
        Some(event)
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        !self.phase.is_terminal()
    }

    pub fn trial_index(&self) -> usize {
        self.trial_index
    }

    pub fn plan_len(&self) -> usize {
        self.plan.len()
    }

    /// Stimulus of the trial in progress, if one is.
    pub fn current_stimulus(&self) -> Option<&StimulusId> {
        if self.phase.is_terminal() {
            return None;
        }
        self.plan.get(self.trial_index)
    }

    /// Timestamp captured at the Presenting -> Masking transition.
    pub fn stimulus_onset_ms(&self) -> Option<u64> {
        self.onset_ms
    }

    /// When the host should call `advance` next. `None` while idle,
    /// complete, or waiting on subject input.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.timers.next_deadline_ms()
    }

    fn set_phase(&mut self, phase: TrialPhase) -> ClockEvent {
        debug!(
            "phase {:?} -> {phase:?} (trial {}/{})",
            self.phase,
            self.trial_index,
            self.plan.len()
        );
        self.phase = phase;
        ClockEvent::PhaseChanged(phase)
    }

    fn arm_timer(&mut self, after_ms: u64, now_ms: u64) {
        let token = TimerToken {
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.expected_seq = Some(token.seq);
        self.timers.schedule(now_ms + after_ms, token);
    }

    #[cfg(test)]
    fn inject_timer(&mut self, deadline_ms: u64, token: TimerToken) {
        self.timers.schedule(deadline_ms, token);
    }
}

impl Default for TrialClock {
    fn default() -> Self {
        Self::new()
    }
}
