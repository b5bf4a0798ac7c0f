use serde::{Deserialize, Serialize};

/// Fixed series-presentation orders. A participant's group is chosen once,
/// before any data loads, and is immutable for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterbalanceGroup {
    A,
    B,
    C,
    D,
}

impl CounterbalanceGroup {
    pub const ALL: [CounterbalanceGroup; 4] = [
        CounterbalanceGroup::A,
        CounterbalanceGroup::B,
        CounterbalanceGroup::C,
        CounterbalanceGroup::D,
    ];

    pub fn series_order(self) -> [&'static str; 4] {
        match self {
            CounterbalanceGroup::A => ["Series-1a", "Series-1b", "Series-2a", "Series-2b"],
            CounterbalanceGroup::B => ["Series-1a", "Series-1b", "Series-2b", "Series-2a"],
            CounterbalanceGroup::C => ["Series-1b", "Series-1a", "Series-2a", "Series-2b"],
            CounterbalanceGroup::D => ["Series-1b", "Series-1a", "Series-2b", "Series-2a"],
        }
    }
}

/// Session parameters. One configurable sequencer covers both the
/// single-series and the counterbalanced four-series variants.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long stimuli stay visible after a trial starts.
    pub exposure_ms: u64,
    /// Practice trials drawn per ground-truth category.
    pub practice_per_category: usize,
    /// Indices of series that open with a practice block.
    pub practice_before: Vec<usize>,
    pub counterbalance: Option<CounterbalanceGroup>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exposure_ms: 3_000,
            practice_per_category: 2,
            // The first series of each stimulus kind under the four-series
            // orders: indices 0 and 2.
            practice_before: vec![0, 2],
            counterbalance: None,
        }
    }
}

impl SessionConfig {
    pub fn counterbalanced(group: CounterbalanceGroup) -> Self {
        Self {
            counterbalance: Some(group),
            ..Self::default()
        }
    }

    pub fn single_series(practice: bool) -> Self {
        Self {
            practice_before: if practice { vec![0] } else { Vec::new() },
            counterbalance: None,
            ..Self::default()
        }
    }

    pub fn practice_for(&self, series_index: usize) -> bool {
        self.practice_before.contains(&series_index)
    }
}
