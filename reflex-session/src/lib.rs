pub mod clock;
pub mod config;
pub mod plan;
pub mod recorder;
pub mod session;
pub mod stats;

pub use clock::{ClockEvent, TrialClock, TrialPhase};
pub use config::TestConfig;
pub use plan::TrialPlan;
pub use recorder::{KeyMatcher, ResponseRecorder};
pub use session::{Session, SessionEvent};
pub use stats::{RankedItem, SessionSummary};
