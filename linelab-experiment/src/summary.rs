use linelab_core::TrialRecord;

/// Accuracy and mean response time over one record set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    pub trials: usize,
    pub accuracy_pct: f64,
    pub mean_response_ms: f64,
}

impl SeriesSummary {
    /// `None` for an empty record set, so a division by zero can never put
    /// NaN on a display path. Callers render the `None` case as "n/a".
    pub fn from_records(records: &[TrialRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let correct = records.iter().filter(|r| r.is_correct()).count();
        let total_ms: u64 = records.iter().map(|r| r.response_time_ms).sum();
        let n = records.len() as f64;
        Some(Self {
            trials: records.len(),
            accuracy_pct: correct as f64 / n * 100.0,
            mean_response_ms: total_ms as f64 / n,
        })
    }
}
