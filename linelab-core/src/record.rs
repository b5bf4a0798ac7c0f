use crate::series::StimulusKind;
use crate::trial::{Judgment, LineStimulus, Trial};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one presented trial. The stimulus values are copied in so
/// export never has to re-join against the original trial list. Ground
/// truth and correctness are derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// 1-based position within the set the trial was presented in.
    pub trial_index: usize,
    pub first: LineStimulus,
    pub second: LineStimulus,
    pub response: Judgment,
    /// Elapsed time from trial start to response, in milliseconds.
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl TrialRecord {
    pub fn ground_truth(&self) -> Judgment {
        Trial::new(self.first, self.second).ground_truth()
    }

    pub fn is_correct(&self) -> bool {
        self.response == self.ground_truth()
    }
}

/// Finalized records of one completed series. Never mutated after the
/// series finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecords {
    pub name: String,
    pub kind: StimulusKind,
    pub records: Vec<TrialRecord>,
}
