pub mod catalog;
pub mod error;
pub mod record;
pub mod stimulus;

pub use catalog::StimulusCatalog;
pub use error::Error;
pub use record::TrialRecord;
pub use stimulus::{StimulusId, StimulusItem};
