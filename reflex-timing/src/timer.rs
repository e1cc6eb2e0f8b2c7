use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Millisecond clock driving the trial state machine. Hosts feed its
/// readings into the engine; the engine itself never reads wall time.
pub trait Clock {
    fn now_ms(&self) -> u64;

    fn elapsed_ms(&self, since_ms: u64) -> u64 {
        self.now_ms().saturating_sub(since_ms)
    }
}

/// Monotonic clock anchored at construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Hand-advanced clock for deterministic tests and simulated hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }

    pub fn set(&mut self, now_ms: u64) {
        self.now = now_ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now
    }
}

/// Identifies one scheduled timer. The generation changes whenever a
/// session starts or stops, so an entry left over from an earlier
/// session is recognized and dropped when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken {
    pub generation: u64,
    pub seq: u64,
}

/// Deadline-ordered timer queue. Due entries come out in deadline
/// order; the whole queue can be dropped as a unit with `clear`.
#[derive(Debug, Default)]
pub struct DelayQueue {
    heap: BinaryHeap<Reverse<(u64, TimerToken)>>,
}

impl DelayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline_ms: u64, token: TimerToken) {
        log::trace!("timer {token:?} scheduled for t={deadline_ms}");
        self.heap.push(Reverse((deadline_ms, token)));
    }

    /// Deadline of the soonest pending timer, if any.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Removes and returns every timer whose deadline has passed.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<TimerToken> {
        let mut due = Vec::new();
        while let Some(Reverse((deadline, _))) = self.heap.peek() {
            if *deadline > now_ms {
                break;
            }
            if let Some(Reverse((_, token))) = self.heap.pop() {
                due.push(token);
            }
        }
        due
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
