pub mod phase;
pub mod record;
pub mod series;
pub mod trial;

pub use phase::SessionPhase;
pub use record::{SeriesRecords, TrialRecord};
pub use series::{Series, StimulusKind};
pub use trial::{Judgment, LineStimulus, Trial};
