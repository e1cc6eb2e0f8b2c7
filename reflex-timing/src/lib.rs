pub mod timer;

pub use timer::{Clock, DelayQueue, ManualClock, MonotonicClock, TimerToken};
