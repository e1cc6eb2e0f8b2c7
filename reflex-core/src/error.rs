use crate::stimulus::StimulusId;
use thiserror::Error;

/// Errors surfaced synchronously to the caller. Timers never produce
/// errors; anything that goes wrong inside a timer callback is logged
/// and dropped instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Input rejected before it touched any state.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Operation not legal in the current phase.
    #[error("invalid call to {operation}: {detail}")]
    State {
        operation: &'static str,
        detail: String,
    },
    /// The referenced stimulus is not (or no longer) in the catalog.
    #[error("stimulus {0} not found")]
    NotFound(StimulusId),
}
